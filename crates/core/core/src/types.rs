//! Typed webhook payloads.
//!
//! Every envelope has the same shape, `{ "event", "timestamp"?, "data" }`.
//! Only `data` is dispatched to handlers. Fields a schema does not know are
//! ignored so that the platform can add fields without breaking receivers.

use ghala_webhooks::WebhookEventType;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// An order identifier.
///
/// The platform sends it either as a JSON integer or a JSON string; both are
/// kept as the decimal string, so `123` and `"123"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// Creates an order id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for OrderId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Uint(u64),
            Str(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Ok(Self(n.to_string())),
            Raw::Uint(n) => Ok(Self(n.to_string())),
            Raw::Str(s) if s.is_empty() => Err(serde::de::Error::custom("order_id must not be empty")),
            Raw::Str(s) => Ok(Self(s)),
        }
    }
}

/// Reads a number that may be absent or `null`, defaulting to zero.
fn zero_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// The buyer attached to an order or payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A line item of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_id: Option<String>,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub discount_amount: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub additional_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_cost_description: Option<String>,
    pub quantity: f64,
}

/// Data of the `order.*` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
    pub customer: Customer,
    pub order_id: OrderId,
    pub total: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub discount_total: f64,
    #[serde(default, deserialize_with = "zero_if_null")]
    pub promo_discount_amount: f64,
    pub products: Vec<Product>,
}

/// Data of the `payment.*` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentData {
    pub order_id: OrderId,
    pub amount: f64,
    pub currency: String,
    pub payment_id: String,
    pub status: String,
    pub customer: Customer,
}

/// A webhook envelope as sent by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<D> {
    /// The event name as written by the sender. Not checked against the endpoint.
    pub event: String,
    /// Sender-side timestamp, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub data: D,
}

/// The decoded data of any webhook event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Order(OrderData),
    Payment(PaymentData),
}

impl Payload {
    /// Decodes the envelope for `event_type` and returns its `data`.
    pub fn decode(event_type: WebhookEventType, body: &str) -> Result<Self, serde_json::Error> {
        if event_type.is_order() {
            let envelope: Envelope<OrderData> = serde_json::from_str(body)?;
            Ok(Self::Order(envelope.data))
        } else {
            let envelope: Envelope<PaymentData> = serde_json::from_str(body)?;
            Ok(Self::Payment(envelope.data))
        }
    }

    /// The order this payload refers to.
    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Order(order) => &order.order_id,
            Self::Payment(payment) => &payment.order_id,
        }
    }

    /// The customer attached to the payload.
    pub fn customer(&self) -> &Customer {
        match self {
            Self::Order(order) => &order.customer,
            Self::Payment(payment) => &payment.customer,
        }
    }

    /// Returns the order data, if this is an order event.
    pub fn as_order(&self) -> Option<&OrderData> {
        match self {
            Self::Order(order) => Some(order),
            Self::Payment(_) => None,
        }
    }

    /// Returns the payment data, if this is a payment event.
    pub fn as_payment(&self) -> Option<&PaymentData> {
        match self {
            Self::Payment(payment) => Some(payment),
            Self::Order(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_body(order_id: serde_json::Value) -> String {
        json!({
            "event": "order.created",
            "data": {
                "customer": {"name": "Amina", "phone_number": "255700000000", "loyalty_tier": "gold"},
                "order_id": order_id,
                "total": 15000.0,
                "products": [
                    {"id": 7, "name": "Maize flour", "price": 5000.0, "quantity": 3, "discount_amount": null}
                ],
                "channel": "whatsapp"
            }
        })
        .to_string()
    }

    #[test]
    fn test_order_id_accepts_int_and_string() {
        let from_int = Payload::decode(WebhookEventType::OrderCreated, &order_body(json!(123))).unwrap();
        let from_str = Payload::decode(WebhookEventType::OrderCreated, &order_body(json!("123"))).unwrap();

        assert_eq!(from_int.order_id(), &"123");
        assert_eq!(from_int, from_str);
    }

    #[test]
    fn test_defaults_and_unknown_fields() {
        let payload = Payload::decode(WebhookEventType::OrderCreated, &order_body(json!(1))).unwrap();
        let order = payload.as_order().unwrap();

        assert_eq!(order.discount_total, 0.0);
        assert_eq!(order.promo_discount_amount, 0.0);
        assert_eq!(order.products[0].discount_amount, 0.0);
        assert_eq!(order.products[0].additional_cost, 0.0);
        assert_eq!(order.customer.phone_number.as_deref(), Some("255700000000"));
        assert!(payload.as_payment().is_none());
    }

    #[test]
    fn test_payment_envelope_with_timestamp() {
        let body = json!({
            "event": "payment.successful",
            "timestamp": 1700000000.5,
            "data": {
                "order_id": 42,
                "amount": 2500.0,
                "currency": "TZS",
                "payment_id": "pay_1",
                "status": "success",
                "customer": {"name": "Juma"}
            }
        })
        .to_string();

        let payload = Payload::decode(WebhookEventType::PaymentSuccessful, &body).unwrap();
        let payment = payload.as_payment().unwrap();
        assert_eq!(payment.order_id.as_str(), "42");
        assert_eq!(payment.currency, "TZS");
        assert_eq!(payload.customer().name, "Juma");
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        // An order body does not satisfy the payment schema.
        assert!(Payload::decode(WebhookEventType::PaymentFailed, &order_body(json!(1))).is_err());
        assert!(Payload::decode(WebhookEventType::OrderCreated, "{\"event\":\"order.created\"}").is_err());
        assert!(Payload::decode(WebhookEventType::OrderCreated, "not json").is_err());
        assert!(Payload::decode(WebhookEventType::OrderCreated, &order_body(json!(""))).is_err());
        assert!(Payload::decode(WebhookEventType::OrderCreated, &order_body(json!(1.5))).is_err());
    }
}
