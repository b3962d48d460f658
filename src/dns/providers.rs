use serde::{Deserialize, Serialize};

/// Mail-hosting families recognized by MX exchange suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderFamily {
    GoogleWorkspace,
    Microsoft365,
    YahooMail,
    ProtonMail,
    Zoho,
    Fastmail,
    Proofpoint,
    Mimecast,
}

/// Exchange-host suffixes for each family. Checked after lowercasing and
/// stripping the trailing dot, so `ASPMX.L.GOOGLE.COM.` matches `google.com`.
const SUFFIX_TABLE: &[(&str, ProviderFamily)] = &[
    ("google.com", ProviderFamily::GoogleWorkspace),
    ("googlemail.com", ProviderFamily::GoogleWorkspace),
    ("outlook.com", ProviderFamily::Microsoft365),
    ("yahoodns.net", ProviderFamily::YahooMail),
    ("protonmail.ch", ProviderFamily::ProtonMail),
    ("zoho.com", ProviderFamily::Zoho),
    ("zoho.eu", ProviderFamily::Zoho),
    ("messagingengine.com", ProviderFamily::Fastmail),
    ("pphosted.com", ProviderFamily::Proofpoint),
    ("mimecast.com", ProviderFamily::Mimecast),
];

impl ProviderFamily {
    /// Matches an MX exchange host against the suffix table.
    pub fn from_exchange(exchange: &str) -> Option<Self> {
        let host = exchange.trim_end_matches('.').to_lowercase();
        SUFFIX_TABLE
            .iter()
            .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{suffix}")))
            .map(|(_, family)| *family)
    }

    /// Large consumer/workspace mailbox providers. Security gateways route
    /// mail but say nothing about how common the mailbox host is.
    pub fn is_popular(self) -> bool {
        !matches!(self, ProviderFamily::Proofpoint | ProviderFamily::Mimecast)
    }

    /// Warning code attached by the validator when this family is detected.
    pub fn warning_code(self) -> &'static str {
        match self {
            ProviderFamily::GoogleWorkspace => "GOOGLE_WORKSPACE",
            ProviderFamily::Microsoft365 => "MICROSOFT_365",
            ProviderFamily::YahooMail => "YAHOO_MAIL",
            ProviderFamily::ProtonMail => "PROTON_MAIL",
            ProviderFamily::Zoho => "ZOHO_MAIL",
            ProviderFamily::Fastmail => "FASTMAIL",
            ProviderFamily::Proofpoint => "PROOFPOINT_GATEWAY",
            ProviderFamily::Mimecast => "MIMECAST_GATEWAY",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProviderFamily::GoogleWorkspace => "Google Workspace",
            ProviderFamily::Microsoft365 => "Microsoft 365",
            ProviderFamily::YahooMail => "Yahoo Mail",
            ProviderFamily::ProtonMail => "Proton Mail",
            ProviderFamily::Zoho => "Zoho Mail",
            ProviderFamily::Fastmail => "Fastmail",
            ProviderFamily::Proofpoint => "Proofpoint",
            ProviderFamily::Mimecast => "Mimecast",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_mx_suffix_matches() {
        assert_eq!(
            ProviderFamily::from_exchange("aspmx.l.google.com"),
            Some(ProviderFamily::GoogleWorkspace)
        );
        assert_eq!(
            ProviderFamily::from_exchange("ASPMX.L.GOOGLE.COM."),
            Some(ProviderFamily::GoogleWorkspace)
        );
    }

    #[test]
    fn microsoft_and_gateways() {
        assert_eq!(
            ProviderFamily::from_exchange("contoso-com.mail.protection.outlook.com"),
            Some(ProviderFamily::Microsoft365)
        );
        assert_eq!(
            ProviderFamily::from_exchange("mxa-00000000.gslb.pphosted.com"),
            Some(ProviderFamily::Proofpoint)
        );
    }

    #[test]
    fn suffix_must_be_on_label_boundary() {
        assert_eq!(ProviderFamily::from_exchange("notgoogle.com"), None);
        assert_eq!(ProviderFamily::from_exchange("mx.example.org"), None);
    }

    #[test]
    fn popularity_excludes_gateways() {
        assert!(ProviderFamily::GoogleWorkspace.is_popular());
        assert!(ProviderFamily::Zoho.is_popular());
        assert!(!ProviderFamily::Proofpoint.is_popular());
        assert!(!ProviderFamily::Mimecast.is_popular());
    }
}
