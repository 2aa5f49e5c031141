use crate::hub::NoticeKey;
use std::collections::HashMap;

/// Why a credentials delivery was not accepted, and what to tell the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub key: NoticeKey,
    pub message: &'static str,
}

impl Rejection {
    fn new(key: NoticeKey, message: &'static str) -> Self {
        Self { key, message }
    }
}

/// Account credentials. Each field can be set exactly once; redelivering the
/// stored value is accepted, a different value is not.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

enum Slot {
    Stored,
    Missing,
    Conflict,
}

fn take_once(slot: &mut Option<String>, offered: Option<&String>) -> Slot {
    match (slot.as_deref(), offered) {
        (None, Some(value)) => {
            *slot = Some(value.clone());
            Slot::Stored
        }
        (Some(current), Some(value)) if current == value => Slot::Stored,
        (Some(_), None) => Slot::Stored,
        (Some(_), Some(_)) => Slot::Conflict,
        (None, None) => Slot::Missing,
    }
}

impl Credentials {
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Both fields stored and non-empty
    pub fn usable(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => Some((e, p)),
            _ => None,
        }
    }

    /// Take `email` and `password` from custom parameters. Email is checked
    /// first; a stored email stays stored even if the password is rejected.
    pub fn accept(&mut self, params: &HashMap<String, String>) -> Result<(), Rejection> {
        match take_once(&mut self.email, params.get("email")) {
            Slot::Stored => {}
            Slot::Missing => {
                return Err(Rejection::new(
                    NoticeKey::Email,
                    "Please provide email address in custom parameters",
                ));
            }
            Slot::Conflict => {
                return Err(Rejection::new(
                    NoticeKey::Email,
                    "Email address is already set, restart the node server to change it",
                ));
            }
        }

        match take_once(&mut self.password, params.get("password")) {
            Slot::Stored => {}
            Slot::Missing => {
                return Err(Rejection::new(
                    NoticeKey::Pass,
                    "Please provide password in custom parameters",
                ));
            }
            Slot::Conflict => {
                return Err(Rejection::new(
                    NoticeKey::Pass,
                    "Password is already set, restart the node server to change it",
                ));
            }
        }

        self.usable().map(|_| ()).ok_or(Rejection::new(
            NoticeKey::Cfg,
            "Please provide email address and password",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn accepts_first_complete_delivery() {
        let mut creds = Credentials::default();
        creds
            .accept(&params(&[("email", "a@b.com"), ("password", "x")]))
            .unwrap();
        assert_eq!(creds.usable(), Some(("a@b.com", "x")));
    }

    #[test]
    fn missing_fields_get_their_own_notice() {
        let mut creds = Credentials::default();
        let err = creds.accept(&params(&[("password", "x")])).unwrap_err();
        assert_eq!(err.key, NoticeKey::Email);
        assert!(creds.email().is_none());
        // Password was never looked at
        assert!(creds.password().is_none());

        let err = creds.accept(&params(&[("email", "a@b.com")])).unwrap_err();
        assert_eq!(err.key, NoticeKey::Pass);
        assert_eq!(creds.email(), Some("a@b.com"));
    }

    #[test]
    fn credentials_are_set_once() {
        let mut creds = Credentials::default();
        creds
            .accept(&params(&[("email", "a@b.com"), ("password", "x")]))
            .unwrap();

        let err = creds
            .accept(&params(&[("email", "c@d.com"), ("password", "y")]))
            .unwrap_err();
        assert_eq!(err.key, NoticeKey::Email);
        assert_eq!(creds.email(), Some("a@b.com"));
        assert_eq!(creds.password(), Some("x"));

        let err = creds
            .accept(&params(&[("email", "a@b.com"), ("password", "y")]))
            .unwrap_err();
        assert_eq!(err.key, NoticeKey::Pass);
        assert_eq!(creds.password(), Some("x"));
    }

    #[test]
    fn redelivery_is_idempotent() {
        let mut creds = Credentials::default();
        let p = params(&[("email", "a@b.com"), ("password", "x")]);
        assert!(creds.accept(&p).is_ok());
        assert!(creds.accept(&p).is_ok());
        assert!(creds.accept(&HashMap::new()).is_ok());
    }

    #[test]
    fn empty_values_are_stored_and_rejected() {
        let mut creds = Credentials::default();
        let err = creds
            .accept(&params(&[("email", ""), ("password", "x")]))
            .unwrap_err();
        assert_eq!(err.key, NoticeKey::Cfg);
        assert_eq!(creds.email(), Some(""));

        // The empty email is now permanent
        let err = creds
            .accept(&params(&[("email", "a@b.com"), ("password", "x")]))
            .unwrap_err();
        assert_eq!(err.key, NoticeKey::Email);
        assert!(creds.usable().is_none());
    }
}
