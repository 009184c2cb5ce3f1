//! Payload builders.
//!
//! These turn generator form state into the string the encoder receives. They are plain
//! templating: the encoder treats their output, or any ciphertext made from it, as opaque text.

use serde::{Deserialize, Serialize};

/// WiFi authentication type, as written in the `T:` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WifiEncryption {
    #[default]
    #[serde(rename = "WPA")]
    Wpa,
    #[serde(rename = "WEP")]
    Wep,
    /// An open network; no `T:` or `P:` field is written.
    #[serde(rename = "nopass")]
    NoPass,
}

impl WifiEncryption {
    fn as_str(self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Wifi {
    pub ssid: String,
    pub password: String,
    pub encryption: WifiEncryption,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VCard {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub mobile: String,
    pub email: String,
    pub website: String,
    pub company: String,
    pub job: String,
    pub street: String,
    pub city: String,
    pub zip: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// The content of a QR code, by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum Payload {
    Text(String),
    Url(String),
    Wifi(Wifi),
    VCard(VCard),
    Email(Email),
}

impl Payload {
    /// Builds the string to encode. Incomplete forms (no SSID, a vCard without any name)
    /// produce an empty string.
    ///
    /// # Example
    ///
    /// ```rust
    /// use uniqr::payload::{Payload, Wifi, WifiEncryption};
    ///
    /// let wifi = Payload::Wifi(Wifi {
    ///     ssid: "home".into(),
    ///     password: "secret".into(),
    ///     encryption: WifiEncryption::Wpa,
    ///     hidden: false,
    /// });
    /// assert_eq!(wifi.to_payload_string(), "WIFI:S:home;T:WPA;P:secret;;");
    /// ```
    pub fn to_payload_string(&self) -> String {
        match self {
            Payload::Text(text) | Payload::Url(text) => text.clone(),
            Payload::Wifi(wifi) => wifi_string(wifi),
            Payload::VCard(card) => vcard_string(card),
            Payload::Email(email) => format!(
                "mailto:{}?subject={}&body={}",
                email.to,
                encode_uri_component(&email.subject),
                encode_uri_component(&email.body)
            ),
        }
    }
}

fn wifi_string(wifi: &Wifi) -> String {
    if wifi.ssid.is_empty() {
        return String::new();
    }
    let mut out = format!("WIFI:S:{};", escape_wifi(&wifi.ssid));
    if wifi.encryption != WifiEncryption::NoPass {
        out += &format!("T:{};", wifi.encryption.as_str());
        out += &format!("P:{};", escape_wifi(&wifi.password));
    }
    if wifi.hidden {
        out += "H:true;";
    }
    out.push(';');
    out
}

/// Backslash-escapes the characters the WiFi field syntax reserves.
fn escape_wifi(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn vcard_string(card: &VCard) -> String {
    if card.first_name.is_empty() && card.last_name.is_empty() && card.company.is_empty() {
        return String::new();
    }
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{};{};;;", card.last_name, card.first_name),
        format!("FN:{} {}", card.first_name, card.last_name)
            .trim()
            .to_string(),
    ];
    let optional = [
        ("ORG", &card.company),
        ("TITLE", &card.job),
        ("TEL;TYPE=CELL", &card.mobile),
        ("TEL;TYPE=WORK", &card.phone),
        ("EMAIL", &card.email),
        ("URL", &card.website),
    ];
    for (key, value) in optional {
        if !value.is_empty() {
            lines.push(format!("{key}:{value}"));
        }
    }
    if !(card.street.is_empty() && card.city.is_empty() && card.country.is_empty()) {
        lines.push(format!(
            "ADR;TYPE=WORK:;;{};{};;{};{}",
            card.street, card.city, card.zip, card.country
        ));
    }
    lines.push("END:VCARD".to_string());
    lines.join("\n")
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`, byte by byte in UTF-8.
fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out += &format!("%{byte:02X}"),
        }
    }
    out
}
