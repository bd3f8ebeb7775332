use anyhow::anyhow;
use rocket::data::{self, Data, FromData};
use rocket::form::{Errors, Form, FromForm};
use rocket::fs::TempFile;
use rocket::outcome::Outcome;
use rocket::request::Request;
use rocket::serde::json::Json;
use serde::de::DeserializeOwned;

use crate::api::{AppError, AppResult, ErrorKind};
use crate::table::lenient::parse_amount;
use crate::table::{Collection, DirectoryFields, FinancialFields, RecordFields, SchemaKind};

/// Directory fields as sent by an HTML form, with the optional `photo` file part.
#[derive(FromForm, Debug)]
pub struct DirectoryForm<'r> {
    pub name: Option<String>,
    pub businessname: Option<String>,
    pub phoneno: Option<String>,
    pub emailid: Option<String>,
    pub shopno: Option<String>,
    pub remarks: Option<String>,

    #[field(name = "photo")]
    pub photo: Option<TempFile<'r>>,
}

impl<'r> DirectoryForm<'r> {
    fn into_parts(self) -> (DirectoryFields, Option<TempFile<'r>>) {
        let fields = DirectoryFields {
            name: self.name.map(Some),
            businessname: self.businessname.map(Some),
            phoneno: self.phoneno.map(Some),
            emailid: self.emailid.map(Some),
            shopno: self.shopno.map(Some),
            photo: None,
            remarks: self.remarks.map(Some),
        };
        // A plain text `photo` value arrives without a filename; only real file parts count.
        let photo = self
            .photo
            .filter(|file| file.raw_name().is_some() && file.len() > 0);
        (fields, photo)
    }
}

#[derive(FromForm, Debug)]
pub struct FinancialForm {
    pub name: Option<String>,
    #[field(name = "receiptNo")]
    pub receipt_no: Option<String>,
    pub date: Option<String>,
    pub amount: Option<String>,
    #[field(name = "fortheMonth")]
    pub forthe_month: Option<String>,
    pub remarks: Option<String>,
}

impl TryFrom<FinancialForm> for FinancialFields {
    type Error = String;

    fn try_from(form: FinancialForm) -> Result<Self, Self::Error> {
        // A blank amount input clears the column.
        let amount = form.amount.as_deref().map(parse_amount).transpose()?;
        Ok(FinancialFields {
            name: form.name.map(Some),
            receipt_no: form.receipt_no.map(Some),
            date: form.date.map(Some),
            amount,
            forthe_month: form.forthe_month.map(Some),
            remarks: form.remarks.map(Some),
        })
    }
}

/// Request body of a create or update, already narrowed to the columns of the
/// addressed collection.
///
/// JSON bodies are read as JSON; urlencoded and multipart bodies as forms.
/// Keys the collection does not know are dropped here.
#[derive(Debug)]
pub struct RecordPayload<'r> {
    pub fields: RecordFields,
    pub attachment: Option<TempFile<'r>>,
}

#[rocket::async_trait]
impl<'r> FromData<'r> for RecordPayload<'r> {
    type Error = AppError;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        let collection = match req.param::<Collection>(0) {
            Some(Ok(collection)) => collection,
            _ => {
                let err = AppError::not_found();
                return Outcome::Error((err.status(), err));
            }
        };

        let is_form = req
            .content_type()
            .is_some_and(|ct| ct.is_form() || ct.is_form_data());

        let payload = match (collection.kind(), is_form) {
            (SchemaKind::Directory, true) => {
                parse_form::<DirectoryForm<'r>>(req, data)
                    .await
                    .map(|form| {
                        let (fields, attachment) = form.into_parts();
                        RecordPayload {
                            fields: fields.into(),
                            attachment,
                        }
                    })
            }
            (SchemaKind::Financial, true) => parse_form::<FinancialForm>(req, data)
                .await
                .and_then(|form| {
                    FinancialFields::try_from(form).map_err(AppError::bad_request)
                })
                .map(|fields| RecordPayload {
                    fields: fields.into(),
                    attachment: None,
                }),
            (SchemaKind::Directory, false) => {
                parse_json::<DirectoryFields>(req, data)
                    .await
                    .map(|fields| RecordPayload {
                        fields: fields.into(),
                        attachment: None,
                    })
            }
            (SchemaKind::Financial, false) => {
                parse_json::<FinancialFields>(req, data)
                    .await
                    .map(|fields| RecordPayload {
                        fields: fields.into(),
                        attachment: None,
                    })
            }
        };

        match payload {
            Ok(payload) => Outcome::Success(payload),
            Err(err) => Outcome::Error((err.status(), err)),
        }
    }
}

async fn parse_form<'r, T: FromForm<'r>>(req: &'r Request<'_>, data: Data<'r>) -> AppResult<T> {
    match Form::<T>::from_data(req, data).await {
        Outcome::Success(form) => Ok(form.into_inner()),
        Outcome::Error((_, errors)) => Err(form_error(errors)),
        Outcome::Forward(_) => Err(AppError::bad_request("Unsupported form body")),
    }
}

async fn parse_json<'r, T: DeserializeOwned>(
    req: &'r Request<'_>,
    data: Data<'r>,
) -> AppResult<T> {
    match Json::<T>::from_data(req, data).await {
        Outcome::Success(json) => Ok(json.into_inner()),
        Outcome::Error((_, error)) => Err(AppError::new(
            ErrorKind::BadRequest,
            anyhow!(error.to_string()).context("Failed to parse JSON body"),
        )),
        Outcome::Forward(_) => Err(AppError::bad_request("Unsupported JSON body")),
    }
}

fn form_error(errors: Errors<'_>) -> AppError {
    let error_chain = errors
        .iter()
        .map(|e| anyhow!(e.to_string()))
        .reduce(|acc, e| acc.context(e.to_string()));

    let error = match error_chain {
        Some(chain) => chain.context("Failed to parse form"),
        None => anyhow!("Failed to parse form with unknown error"),
    };
    AppError::new(ErrorKind::BadRequest, error)
}
