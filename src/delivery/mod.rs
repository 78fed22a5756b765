//! Outbound email delivery port.
//!
//! The pipeline only needs a single `send` operation. [`http::HttpMailer`]
//! implements it against a JSON-over-HTTPS email API; tests substitute
//! their own implementations.

pub mod http;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::Result;

/// A fully rendered email ready for submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Confirmation returned by the delivery service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// Provider-assigned message id.
    pub id: String,
}

/// Black-box email submission.
pub trait MailDelivery: Send + Sync {
    /// Submit one message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Delivery`](crate::AppError::Delivery) if the
    /// service rejects the message or cannot be reached.
    fn send<'a>(
        &'a self,
        message: &'a EmailMessage,
    ) -> Pin<Box<dyn Future<Output = Result<DeliveryReceipt>> + Send + 'a>>;
}
