// src/session/user.rs — The authenticated user's profile snapshot

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Profile and subscription snapshot returned by the backend at login.
///
/// The snapshot can go stale (premium status in particular) until it is
/// refreshed. Fields the client does not model are kept in `extra` so a
/// persisted copy round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub premium_until: Option<DateTime<Utc>>,
    /// Set while `premium_until` is a local optimistic value the server
    /// has not confirmed yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_override: Option<PremiumOverride>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Backends disagree on whether ids are strings or integers; accept both.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Timestamps arrive as RFC 3339 or as naive ISO 8601 without an offset,
/// which is read as UTC.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse_timestamp(raw.trim())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PremiumOverride {
    pub applied_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            introduction: None,
            subscription: None,
            premium_until: None,
            premium_override: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_premium_until(mut self, until: DateTime<Utc>) -> Self {
        self.premium_until = Some(until);
        self
    }

    /// Premium when `premium_until` lies in the future. Absent or past means free tier.
    pub fn is_premium(&self) -> bool {
        self.is_premium_at(Utc::now())
    }

    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }

    pub fn is_admin(&self, admin_user_id: &str) -> bool {
        self.id == admin_user_id
    }

    /// Whether the premium fields come from an unconfirmed local patch.
    pub fn has_local_premium_override(&self) -> bool {
        self.premium_override.is_some()
    }

    /// Optimistic patch applied after a payment completes, before the
    /// server confirms it.
    pub(crate) fn apply_premium_override(
        &mut self,
        is_premium: bool,
        premium_until: Option<DateTime<Utc>>,
        premium_days: i64,
        now: DateTime<Utc>,
    ) {
        self.premium_until = if is_premium {
            Some(premium_until.unwrap_or(now + Duration::days(premium_days)))
        } else {
            None
        };
        self.premium_override = Some(PremiumOverride { applied_at: now });
    }

    /// Apply the server's premium flag and drop any local override.
    ///
    /// The premium-status endpoint carries no end date, so a confirmed
    /// premium user keeps a future `premium_until` if one is known and
    /// otherwise gets the default window.
    pub(crate) fn reconcile_premium(
        &mut self,
        is_premium: bool,
        premium_days: i64,
        now: DateTime<Utc>,
    ) {
        if is_premium {
            if !self.is_premium_at(now) {
                self.premium_until = Some(now + Duration::days(premium_days));
            }
        } else {
            self.premium_until = None;
        }
        self.premium_override = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_free_tier_without_premium_until() {
        let user = UserRecord::new("u1");
        assert!(!user.is_premium());
    }

    #[test]
    fn test_past_premium_until_is_free_tier() {
        let user = UserRecord::new("u1").with_premium_until(Utc::now() - Duration::days(1));
        assert!(!user.is_premium());
    }

    #[test]
    fn test_future_premium_until_is_premium() {
        let user = UserRecord::new("u1").with_premium_until(Utc::now() + Duration::days(1));
        assert!(user.is_premium());
    }

    #[test]
    fn test_admin_sentinel() {
        assert!(UserRecord::new("admin").is_admin("admin"));
        assert!(!UserRecord::new("u1").is_admin("admin"));
    }

    #[test]
    fn test_unknown_fields_are_preserved() {
        let json = r#"{"id":"u1","name":"Mika","device_number":"1234","stats":{"memories":3}}"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.name.as_deref(), Some("Mika"));
        assert_eq!(user.extra["device_number"], "1234");

        let back: UserRecord = serde_json::from_str(&serde_json::to_string(&user).unwrap()).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_numeric_id_accepted() {
        let user: UserRecord = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(user.id, "42");
    }

    #[test]
    fn test_naive_premium_until_read_as_utc() {
        let user: UserRecord =
            serde_json::from_str(r#"{"id":"u1","premium_until":"2026-11-18T10:00:00.123456"}"#)
                .unwrap();
        assert_eq!(
            user.premium_until.unwrap().to_rfc3339(),
            "2026-11-18T10:00:00.123456+00:00"
        );

        let user: UserRecord =
            serde_json::from_str(r#"{"id":"u1","premium_until":"2026-11-18 10:00:00"}"#).unwrap();
        assert_eq!(
            user.premium_until.unwrap().to_rfc3339(),
            "2026-11-18T10:00:00+00:00"
        );
    }

    #[test]
    fn test_offset_premium_until_and_null() {
        let user: UserRecord =
            serde_json::from_str(r#"{"id":"u1","premium_until":"2026-11-18T19:00:00+09:00"}"#)
                .unwrap();
        assert_eq!(
            user.premium_until.unwrap().to_rfc3339(),
            "2026-11-18T10:00:00+00:00"
        );

        let user: UserRecord =
            serde_json::from_str(r#"{"id":"u1","premium_until":null}"#).unwrap();
        assert_eq!(user.premium_until, None);

        assert!(serde_json::from_str::<UserRecord>(r#"{"id":"u1","premium_until":"soon"}"#).is_err());
    }

    #[test]
    fn test_missing_id_rejected() {
        assert!(serde_json::from_str::<UserRecord>(r#"{"name":"x"}"#).is_err());
    }

    #[test]
    fn test_override_default_window() {
        let now = Utc::now();
        let mut user = UserRecord::new("u1");
        user.apply_premium_override(true, None, 30, now);
        assert_eq!(user.premium_until, Some(now + Duration::days(30)));
        assert!(user.has_local_premium_override());
    }

    #[test]
    fn test_reconcile_clears_override() {
        let now = Utc::now();
        let mut user = UserRecord::new("u1");
        user.apply_premium_override(true, None, 30, now);
        user.reconcile_premium(false, 30, now);
        assert!(user.premium_until.is_none());
        assert!(!user.has_local_premium_override());
    }

    #[test]
    fn test_reconcile_keeps_known_future_date() {
        let now = Utc::now();
        let until = now + Duration::days(200);
        let mut user = UserRecord::new("u1").with_premium_until(until);
        user.reconcile_premium(true, 30, now);
        assert_eq!(user.premium_until, Some(until));
    }
}
