//! Payload templates for the content types the generator offers.
//!
//! These are plain string templates. Only the mail parameters are
//! percent-encoded; field contents are otherwise passed through as typed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wi-Fi authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WifiEncryption {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "nopass")]
    NoPass,
}

impl WifiEncryption {
    pub fn as_str(self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

/// Structured input for one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "fields", rename_all = "lowercase")]
pub enum Payload {
    Url(String),
    Text(String),
    Wifi {
        ssid: String,
        password: String,
        encryption: WifiEncryption,
        hidden: bool,
    },
    Email {
        to: String,
        subject: String,
        body: String,
    },
    Sms {
        phone: String,
        message: String,
    },
    VCard {
        name: String,
        phone: String,
        email: String,
        org: String,
    },
}

impl Payload {
    /// The string encoded into the code.
    pub fn encode(&self) -> String {
        match self {
            Payload::Url(url) => url.clone(),
            Payload::Text(text) => text.clone(),
            Payload::Wifi {
                ssid,
                password,
                encryption,
                hidden,
            } => format!(
                "WIFI:T:{};S:{};P:{};H:{};;",
                encryption.as_str(),
                ssid,
                password,
                hidden
            ),
            Payload::Email { to, subject, body } => {
                let mut params = Vec::new();
                if !subject.is_empty() {
                    params.push(format!("subject={}", urlencoding::encode(subject)));
                }
                if !body.is_empty() {
                    params.push(format!("body={}", urlencoding::encode(body)));
                }

                if params.is_empty() {
                    format!("mailto:{}", to)
                } else {
                    format!("mailto:{}?{}", to, params.join("&"))
                }
            }
            Payload::Sms { phone, message } => format!("smsto:{}:{}", phone, message),
            Payload::VCard {
                name,
                phone,
                email,
                org,
            } => format!(
                "BEGIN:VCARD\nVERSION:3.0\nFN:{}\nTEL:{}\nEMAIL:{}\nORG:{}\nEND:VCARD",
                name, phone, email, org
            ),
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
