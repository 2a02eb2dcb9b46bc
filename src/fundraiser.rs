use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use futures_util::TryStreamExt;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use crate::bounded::read_bounded;
use crate::client::default_http_client;
use crate::{Error, Result};

/// Canonical fundraiser-creation endpoint. Used as the endpoint identity on
/// [`GraphError`] values regardless of any base-URL override on the client.
///
/// [`GraphError`]: crate::GraphError
pub const CREATE_FUNDRAISER_ENDPOINT: &str = "https://graph.facebook.com/v2.8/me/fundraisers";

/// Maximum size of a fundraiser cover photo image, in bytes.
pub const COVER_PHOTO_MAX_SIZE: usize = 4 * 1024 * 1024 - 1;

/// The set of parameters required to create a fundraiser.
#[derive(Debug, Clone)]
pub struct CreateFundraiserParams {
    /// Access token of the user creating the fundraiser, as handed out by
    /// the platform's login flow.
    pub access_token: String,
    /// Platform-side identifier of the charity being fundraised for.
    pub charity_id: String,
    /// Title of the fundraiser, up to 70 characters.
    pub title: String,
    /// Description of the fundraiser, up to 50k characters.
    pub description: String,
    /// Goal in the currency's smallest unit. Fundraisers only support whole
    /// values, so for currencies with cents like USD round to an integer and
    /// multiply by 100; for zero-decimal currencies like JPY pass the amount
    /// as-is.
    pub goal: u64,
    /// ISO 4217 code for the goal amount.
    pub currency: String,
    /// When the fundraiser stops accepting donations. Must be in the future
    /// and within five years from now.
    pub end_time: SystemTime,
    /// Identifier generated by the caller to track the fundraiser in their
    /// own system.
    pub external_id: String,
}

impl CreateFundraiserParams {
    pub(crate) fn unix_end_time(&self) -> Result<u64> {
        self.end_time
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .map_err(|_| Error::Encoding("end_time is before the unix epoch".to_string()))
    }
}

/// One optional field or attachment for a fundraiser-creation request.
///
/// Options are applied to the outgoing form in the order the caller supplies
/// them; the first failing option aborts the call before anything is sent.
pub struct FundraiserOption(Inner);

enum Inner {
    Field {
        name: String,
        value: String,
    },
    CoverPhoto {
        filename: String,
        content: Box<dyn AsyncRead + Send + Unpin>,
    },
    CoverPhotoUrl {
        filename: String,
        url: Url,
    },
}

impl FundraiserOption {
    /// Attaches a plain optional text field.
    ///
    /// The platform currently supports `external_fundraiser_uri` (URI of the
    /// fundraiser on the external site), `external_event_name`,
    /// `external_event_uri` and `external_event_start_time` (Unix timestamp
    /// of the day the event takes place).
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self(Inner::Field {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Attaches a cover photo streamed from `content`, capped at
    /// [`COVER_PHOTO_MAX_SIZE`] bytes.
    pub fn cover_photo(
        filename: impl Into<String>,
        content: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self(Inner::CoverPhoto {
            filename: filename.into(),
            content: Box::new(content),
        })
    }

    /// Attaches a cover photo fetched from `url` with a separate HTTP GET,
    /// streamed under the same [`COVER_PHOTO_MAX_SIZE`] cap.
    pub fn cover_photo_url(filename: impl Into<String>, url: Url) -> Self {
        Self(Inner::CoverPhotoUrl {
            filename: filename.into(),
            url,
        })
    }

    pub(crate) async fn apply(self, form: Form) -> Result<Form> {
        match self.0 {
            Inner::Field { name, value } => Ok(form.text(name, value)),
            Inner::CoverPhoto { filename, content } => {
                let bytes = read_bounded(content, COVER_PHOTO_MAX_SIZE).await?;
                Ok(form.part("cover_photo", Part::bytes(bytes).file_name(filename)))
            }
            Inner::CoverPhotoUrl { filename, url } => {
                // Independent client so the fetch gets its own bounded wait.
                let http = default_http_client();
                let response = http.get(url).send().await?;
                let reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
                let bytes = read_bounded(reader, COVER_PHOTO_MAX_SIZE).await?;
                Ok(form.part("cover_photo", Part::bytes(bytes).file_name(filename)))
            }
        }
    }
}
