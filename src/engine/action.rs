//! Menu actions and screen identifiers.
//!
//! Every inline button carries the callback-data form of an `Action`; the
//! router is an exhaustive match, so adding a screen means adding a variant
//! and the compiler points at every site that must handle it.

/// An abstract menu action decoded from callback data
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Begin access-code entry
    EnterAccessCode,
    /// Render the main menu
    ShowMenu,
    /// Generate and store a fresh custodial wallet
    CreateWallet,
    /// Begin the multi-message private-key import flow
    ImportWallet,
    /// Render the wallet list
    ListWallets,
    /// Make the given wallet the user's default
    SetDefault(i64),
    /// Abandon the current flow
    Cancel,
}

impl Action {
    /// Decode callback data; `None` for stale or foreign payloads
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        if let Some(rest) = data.strip_prefix("default:") {
            return rest.parse().ok().map(Self::SetDefault);
        }
        match data {
            "enter_code" => Some(Self::EnterAccessCode),
            "menu" => Some(Self::ShowMenu),
            "create_wallet" => Some(Self::CreateWallet),
            "import_wallet" => Some(Self::ImportWallet),
            "wallets" => Some(Self::ListWallets),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }

    /// The callback-data form carried by inline buttons
    #[must_use]
    pub fn callback_data(&self) -> String {
        match self {
            Self::EnterAccessCode => "enter_code".to_string(),
            Self::ShowMenu => "menu".to_string(),
            Self::CreateWallet => "create_wallet".to_string(),
            Self::ImportWallet => "import_wallet".to_string(),
            Self::ListWallets => "wallets".to_string(),
            Self::SetDefault(wallet_id) => format!("default:{wallet_id}"),
            Self::Cancel => "cancel".to_string(),
        }
    }
}

/// A screen the transport layer knows how to render
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuId {
    /// Overview with the default wallet and its balance
    Main,
    /// Full wallet list with default selection buttons
    Wallets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_data_round_trip() {
        let actions = [
            Action::EnterAccessCode,
            Action::ShowMenu,
            Action::CreateWallet,
            Action::ImportWallet,
            Action::ListWallets,
            Action::SetDefault(42),
            Action::Cancel,
        ];
        for action in actions {
            assert_eq!(Action::parse(&action.callback_data()), Some(action));
        }
    }

    #[test]
    fn test_parse_rejects_unknown_payloads() {
        assert_eq!(Action::parse("comprar"), None);
        assert_eq!(Action::parse("default:"), None);
        assert_eq!(Action::parse("default:abc"), None);
        assert_eq!(Action::parse(""), None);
    }
}
