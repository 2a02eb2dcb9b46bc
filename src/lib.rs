mod bounded;
mod client;
mod error;
mod fundraiser;
mod logger;
mod response;

#[cfg(test)]
mod test_support;

pub use bounded::{BoundedReader, MaxSizeExceeded, is_max_size_exceeded};
pub use client::Client;
pub use error::{Error, GraphError, Result};
pub use fundraiser::{
    COVER_PHOTO_MAX_SIZE, CREATE_FUNDRAISER_ENDPOINT, CreateFundraiserParams, FundraiserOption,
};
pub use logger::Logger;
