//! Event names, subscriptions and per-delivery metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{EventError, EventResult};

/// A dot-namespaced event identifier such as `order.created`.
///
/// Equality is exact. The wildcard token is not a valid event name; use
/// [`Subscription::All`] to subscribe to every event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventName(String);

impl EventName {
    /// Parses and validates an event name.
    pub fn new(name: impl Into<String>) -> EventResult<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(EventError::invalid_name(name, "must not be empty"));
        }
        if name == Subscription::WILDCARD {
            return Err(EventError::invalid_name(
                name,
                "the wildcard is a subscription, not an event name",
            ));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(EventError::invalid_name(name, "must not contain whitespace"));
        }
        if name.split('.').any(str::is_empty) {
            return Err(EventError::invalid_name(name, "contains an empty segment"));
        }

        Ok(Self(name))
    }

    /// Creates an event name from a compile-time constant.
    ///
    /// The name must satisfy the rules of [`EventName::new`]; this is only
    /// checked in debug builds.
    pub fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "invalid static event name: {name}");
        Self(name.to_string())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the namespace (the part before the first dot).
    pub fn namespace(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EventName {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for EventName {
    type Error = EventError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        name.0
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// What a handler is subscribed to.
///
/// Wildcard subscriptions are a separate variant so that no real event name
/// can collide with them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subscription {
    /// Exactly one event name.
    Exact(EventName),
    /// Every event, in addition to exact-match handlers.
    All,
}

impl Subscription {
    /// Token that parses to [`Subscription::All`].
    pub const WILDCARD: &'static str = "*";

    /// Parses `"*"` as [`Subscription::All`] and anything else as an exact name.
    pub fn parse(pattern: &str) -> EventResult<Self> {
        if pattern == Self::WILDCARD {
            Ok(Self::All)
        } else {
            EventName::new(pattern).map(Self::Exact)
        }
    }

    /// Checks whether an event name is covered by this subscription.
    pub fn matches(&self, event: &EventName) -> bool {
        match self {
            Self::Exact(name) => name == event,
            Self::All => true,
        }
    }

    /// Returns true for the wildcard subscription.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<EventName> for Subscription {
    fn from(name: EventName) -> Self {
        Self::Exact(name)
    }
}

impl FromStr for Subscription {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(name) => name.fmt(f),
            Self::All => f.write_str(Self::WILDCARD),
        }
    }
}

/// Metadata shared read-only by every handler invoked for one delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookMeta {
    /// The event being dispatched.
    pub event: EventName,
    /// Identifier assigned to this delivery when it was received.
    pub delivery_id: Uuid,
    /// Server time at which the request was received.
    pub received_at: DateTime<Utc>,
    /// Epoch seconds carried by the request's timestamp header.
    pub timestamp: i64,
    /// Request headers, keyed by lowercase name.
    pub raw_headers: BTreeMap<String, String>,
}

impl WebhookMeta {
    /// Creates metadata for a delivery received now.
    pub fn new(event: EventName, timestamp: i64) -> Self {
        Self {
            event,
            delivery_id: Uuid::new_v4(),
            received_at: Utc::now(),
            timestamp,
            raw_headers: BTreeMap::new(),
        }
    }

    /// Sets the delivery identifier.
    pub fn with_delivery_id(mut self, id: Uuid) -> Self {
        self.delivery_id = id;
        self
    }

    /// Sets the receive time.
    pub fn with_received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = at;
        self
    }

    /// Adds a header; the name is stored lowercase.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.raw_headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Adds several headers.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self = self.with_header(name, value);
        }
        self
    }

    /// Looks up a header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.raw_headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
