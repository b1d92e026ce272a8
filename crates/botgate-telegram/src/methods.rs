//! The static Bot API method registry.
//!
//! Risk for Bot API methods is not computed at call time. The registry is
//! built once from the known method list: ordered regex sets assign every
//! method exactly one family and one risk level, and the result is a
//! plain hash lookup. The table is total over [`KNOWN_METHODS`]; a name
//! outside the set is a typed [`TelegramError::UnknownMethod`], never a
//! silent default.

use botgate_core::RiskLevel;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::TelegramError;

/// Functional grouping of Bot API methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodFamily {
    /// Bans, restrictions, promotions.
    Moderation,
    /// Webhook registration and removal.
    Webhook,
    /// Chat invite link lifecycle.
    InviteLink,
    /// Invoices, shipping, checkout, Star payments.
    Payment,
    /// Telegram Passport data.
    Passport,
    /// Sticker set mutation.
    StickerSet,
    /// Forum topic management.
    Forum,
    /// Chat settings and membership housekeeping.
    ChatManagement,
    /// Sending, editing, and deleting messages.
    Messaging,
    /// File and sticker uploads.
    Media,
    /// Bot session control (logOut, close).
    Session,
    /// Gift sending and queries.
    Gift,
    /// Read-only queries and update handling.
    Query,
}

impl fmt::Display for MethodFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Moderation => "moderation",
            Self::Webhook => "webhook",
            Self::InviteLink => "invite_link",
            Self::Payment => "payment",
            Self::Passport => "passport",
            Self::StickerSet => "sticker_set",
            Self::Forum => "forum",
            Self::ChatManagement => "chat_management",
            Self::Messaging => "messaging",
            Self::Media => "media",
            Self::Session => "session",
            Self::Gift => "gift",
            Self::Query => "query",
        };
        f.write_str(name)
    }
}

/// Registry entry for one method.
#[derive(Debug, Clone, Copy)]
pub struct MethodInfo {
    /// Method name as sent on the wire.
    pub name: &'static str,
    /// Functional family.
    pub family: MethodFamily,
    /// Risk level the pipeline uses instead of the runtime classifier.
    pub risk: RiskLevel,
}

/// Every Bot API method the gateway exposes.
pub const KNOWN_METHODS: &[&str] = &[
    // Updates & webhooks
    "getUpdates",
    "setWebhook",
    "deleteWebhook",
    "getWebhookInfo",
    // Identity & session
    "getMe",
    "logOut",
    "close",
    // Messaging
    "sendMessage",
    "forwardMessage",
    "forwardMessages",
    "copyMessage",
    "copyMessages",
    "sendPhoto",
    "sendAudio",
    "sendDocument",
    "sendVideo",
    "sendAnimation",
    "sendVoice",
    "sendVideoNote",
    "sendPaidMedia",
    "sendMediaGroup",
    "sendLocation",
    "sendVenue",
    "sendContact",
    "sendPoll",
    "sendDice",
    "sendChatAction",
    "setMessageReaction",
    "editMessageText",
    "editMessageCaption",
    "editMessageMedia",
    "editMessageLiveLocation",
    "stopMessageLiveLocation",
    "editMessageReplyMarkup",
    "stopPoll",
    "deleteMessage",
    "deleteMessages",
    // Member moderation
    "banChatMember",
    "unbanChatMember",
    "restrictChatMember",
    "promoteChatMember",
    "setChatAdministratorCustomTitle",
    "banChatSenderChat",
    "unbanChatSenderChat",
    // Chat management
    "setChatPermissions",
    "exportChatInviteLink",
    "createChatInviteLink",
    "editChatInviteLink",
    "createChatSubscriptionInviteLink",
    "editChatSubscriptionInviteLink",
    "revokeChatInviteLink",
    "approveChatJoinRequest",
    "declineChatJoinRequest",
    "setChatPhoto",
    "deleteChatPhoto",
    "setChatTitle",
    "setChatDescription",
    "pinChatMessage",
    "unpinChatMessage",
    "unpinAllChatMessages",
    "leaveChat",
    "getChat",
    "getChatAdministrators",
    "getChatMemberCount",
    "getChatMember",
    "setChatStickerSet",
    "deleteChatStickerSet",
    // Forum topics
    "getForumTopicIconStickers",
    "createForumTopic",
    "editForumTopic",
    "closeForumTopic",
    "reopenForumTopic",
    "deleteForumTopic",
    "unpinAllForumTopicMessages",
    "editGeneralForumTopic",
    "closeGeneralForumTopic",
    "reopenGeneralForumTopic",
    "hideGeneralForumTopic",
    "unhideGeneralForumTopic",
    "unpinAllGeneralForumTopicMessages",
    // User info & files
    "getUserProfilePhotos",
    "setUserEmojiStatus",
    "getFile",
    "getUserChatBoosts",
    // Bot configuration
    "getBusinessConnection",
    "setMyCommands",
    "deleteMyCommands",
    "getMyCommands",
    "setMyName",
    "getMyName",
    "setMyDescription",
    "getMyDescription",
    "setMyShortDescription",
    "getMyShortDescription",
    "setChatMenuButton",
    "getChatMenuButton",
    "setMyDefaultAdministratorRights",
    "getMyDefaultAdministratorRights",
    // Callback & inline
    "answerCallbackQuery",
    "answerInlineQuery",
    "answerWebAppQuery",
    "savePreparedInlineMessage",
    // Stickers
    "sendSticker",
    "getStickerSet",
    "getCustomEmojiStickers",
    "uploadStickerFile",
    "createNewStickerSet",
    "addStickerToSet",
    "setStickerPositionInSet",
    "deleteStickerFromSet",
    "replaceStickerInSet",
    "setStickerEmojiList",
    "setStickerKeywords",
    "setStickerMaskPosition",
    "setStickerSetTitle",
    "setStickerSetThumbnail",
    "setCustomEmojiStickerSetThumbnail",
    "deleteStickerSet",
    // Gifts
    "getAvailableGifts",
    "sendGift",
    // Payments
    "sendInvoice",
    "createInvoiceLink",
    "answerShippingQuery",
    "answerPreCheckoutQuery",
    "getStarTransactions",
    "refundStarPayment",
    "editUserStarSubscription",
    // Passport
    "setPassportDataErrors",
    // Games
    "sendGame",
    "setGameScore",
    "getGameHighScores",
];

/// One classification pattern: regex plus the family and risk it assigns.
struct Tier {
    pattern: Regex,
    family: MethodFamily,
    risk: RiskLevel,
}

fn tiers() -> Vec<Tier> {
    // Ordered; the first matching tier classifies the method. High-risk
    // tiers come first so e.g. deleteWebhook never falls through to the
    // generic delete tier.
    let table: &[(&str, MethodFamily, RiskLevel)] = &[
        (
            r"^(ban|unban|restrict|promote)",
            MethodFamily::Moderation,
            RiskLevel::High,
        ),
        (
            r"^(set|delete)Webhook$",
            MethodFamily::Webhook,
            RiskLevel::High,
        ),
        (r"InviteLink$", MethodFamily::InviteLink, RiskLevel::High),
        (
            r"^(approve|decline)ChatJoinRequest$",
            MethodFamily::Moderation,
            RiskLevel::High,
        ),
        (
            r"^(sendInvoice|createInvoiceLink|answerShippingQuery|answerPreCheckoutQuery|refundStarPayment|editUserStarSubscription)$",
            MethodFamily::Payment,
            RiskLevel::High,
        ),
        (
            r"^setPassportDataErrors$",
            MethodFamily::Passport,
            RiskLevel::High,
        ),
        (
            r"^(createNewStickerSet|addStickerToSet|deleteStickerFromSet|replaceStickerInSet|deleteStickerSet|setSticker|setCustomEmojiStickerSetThumbnail)",
            MethodFamily::StickerSet,
            RiskLevel::High,
        ),
        (
            r"^deleteForumTopic$",
            MethodFamily::Forum,
            RiskLevel::High,
        ),
        // Reads stay low regardless of the family tiers below.
        (r"^get", MethodFamily::Query, RiskLevel::Low),
        // Medium tiers.
        (
            r"ForumTopic",
            MethodFamily::Forum,
            RiskLevel::Medium,
        ),
        (
            r"^deleteMessages?$",
            MethodFamily::Messaging,
            RiskLevel::Medium,
        ),
        (
            r"^delete",
            MethodFamily::ChatManagement,
            RiskLevel::Medium,
        ),
        (
            r"^(pin|unpin)",
            MethodFamily::Messaging,
            RiskLevel::Medium,
        ),
        (r"^upload", MethodFamily::Media, RiskLevel::Medium),
        (
            r"^(copy|forward)",
            MethodFamily::Messaging,
            RiskLevel::Medium,
        ),
        (r"^leave", MethodFamily::ChatManagement, RiskLevel::Medium),
        (
            r"^(close|logOut)$",
            MethodFamily::Session,
            RiskLevel::Medium,
        ),
        (r"Gift", MethodFamily::Gift, RiskLevel::Medium),
        (
            r"^set(Game|Message)",
            MethodFamily::Messaging,
            RiskLevel::Medium,
        ),
        (r"^set", MethodFamily::ChatManagement, RiskLevel::Medium),
        (
            r"^(edit|stop)",
            MethodFamily::Messaging,
            RiskLevel::Medium,
        ),
        (r"^create", MethodFamily::ChatManagement, RiskLevel::Medium),
        // Low defaults.
        (r"^answer", MethodFamily::Query, RiskLevel::Low),
        (r"^send", MethodFamily::Messaging, RiskLevel::Low),
    ];
    table
        .iter()
        .map(|(pattern, family, risk)| Tier {
            pattern: Regex::new(pattern).expect("built-in method pattern must compile"),
            family: *family,
            risk: *risk,
        })
        .collect()
}

/// Total lookup table over the known method set.
#[derive(Debug)]
pub struct MethodRegistry {
    methods: HashMap<&'static str, MethodInfo>,
}

impl MethodRegistry {
    /// Build the registry from [`KNOWN_METHODS`] and the ordered tiers.
    #[must_use]
    pub fn standard() -> Self {
        let tiers = tiers();
        let methods = KNOWN_METHODS
            .iter()
            .map(|&name| {
                let (family, risk) = tiers
                    .iter()
                    .find(|t| t.pattern.is_match(name))
                    .map_or((MethodFamily::Query, RiskLevel::Low), |t| {
                        (t.family, t.risk)
                    });
                (name, MethodInfo { name, family, risk })
            })
            .collect();
        Self { methods }
    }

    /// Shared process-wide registry.
    #[must_use]
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<MethodRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::standard)
    }

    /// Look up a method, if known.
    #[must_use]
    pub fn lookup(&self, method: &str) -> Option<&MethodInfo> {
        self.methods.get(method)
    }

    /// Look up a method, rejecting unknown names with a typed error.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::UnknownMethod`] for names outside the
    /// known set.
    pub fn require(&self, method: &str) -> Result<&MethodInfo, TelegramError> {
        self.lookup(method).ok_or_else(|| TelegramError::UnknownMethod {
            method: method.to_string(),
        })
    }

    /// Number of known methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether the registry is empty (never true for the standard table).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Totality
    // -----------------------------------------------------------------------

    #[test]
    fn test_total_over_known_set() {
        let registry = MethodRegistry::standard();
        assert_eq!(registry.len(), KNOWN_METHODS.len());
        for method in KNOWN_METHODS {
            let info = registry.lookup(method);
            assert!(info.is_some(), "method {method} missing from registry");
        }
    }

    #[test]
    fn test_unknown_method_is_typed_error() {
        let registry = MethodRegistry::standard();
        let err = registry.require("explodeChat").unwrap_err();
        assert!(matches!(err, TelegramError::UnknownMethod { .. }));
        assert!(err.to_string().contains("explodeChat"));
    }

    // -----------------------------------------------------------------------
    // High-risk families
    // -----------------------------------------------------------------------

    #[test]
    fn test_moderation_is_high() {
        let registry = MethodRegistry::standard();
        for method in [
            "banChatMember",
            "unbanChatMember",
            "restrictChatMember",
            "promoteChatMember",
            "banChatSenderChat",
        ] {
            let info = registry.lookup(method).unwrap();
            assert_eq!(info.family, MethodFamily::Moderation, "{method}");
            assert_eq!(info.risk, RiskLevel::High, "{method}");
        }
    }

    #[test]
    fn test_webhooks_and_invite_links_are_high() {
        let registry = MethodRegistry::standard();
        assert_eq!(registry.lookup("setWebhook").unwrap().risk, RiskLevel::High);
        assert_eq!(
            registry.lookup("deleteWebhook").unwrap().risk,
            RiskLevel::High
        );
        assert_eq!(
            registry.lookup("revokeChatInviteLink").unwrap().family,
            MethodFamily::InviteLink
        );
        assert_eq!(
            registry.lookup("exportChatInviteLink").unwrap().risk,
            RiskLevel::High
        );
        // getWebhookInfo is a read and stays low.
        assert_eq!(
            registry.lookup("getWebhookInfo").unwrap().risk,
            RiskLevel::Low
        );
    }

    #[test]
    fn test_payments_and_passport_are_high() {
        let registry = MethodRegistry::standard();
        for method in ["sendInvoice", "refundStarPayment", "setPassportDataErrors"] {
            assert_eq!(registry.lookup(method).unwrap().risk, RiskLevel::High, "{method}");
        }
    }

    #[test]
    fn test_sticker_mutations_high_but_reads_low() {
        let registry = MethodRegistry::standard();
        assert_eq!(
            registry.lookup("createNewStickerSet").unwrap().risk,
            RiskLevel::High
        );
        assert_eq!(
            registry.lookup("deleteStickerSet").unwrap().risk,
            RiskLevel::High
        );
        assert_eq!(registry.lookup("getStickerSet").unwrap().risk, RiskLevel::Low);
        assert_eq!(registry.lookup("sendSticker").unwrap().risk, RiskLevel::Low);
    }

    #[test]
    fn test_forum_deletion_high_other_forum_medium() {
        let registry = MethodRegistry::standard();
        assert_eq!(
            registry.lookup("deleteForumTopic").unwrap().risk,
            RiskLevel::High
        );
        assert_eq!(
            registry.lookup("createForumTopic").unwrap().risk,
            RiskLevel::Medium
        );
        assert_eq!(
            registry.lookup("closeForumTopic").unwrap().family,
            MethodFamily::Forum
        );
    }

    // -----------------------------------------------------------------------
    // Medium tiers
    // -----------------------------------------------------------------------

    #[test]
    fn test_mutations_are_medium() {
        let registry = MethodRegistry::standard();
        for method in [
            "setChatTitle",
            "editMessageText",
            "pinChatMessage",
            "unpinChatMessage",
            "copyMessage",
            "forwardMessage",
            "leaveChat",
            "deleteMessage",
            "deleteChatPhoto",
            "uploadStickerFile",
            "logOut",
            "close",
            "sendGift",
        ] {
            assert_eq!(
                registry.lookup(method).unwrap().risk,
                RiskLevel::Medium,
                "{method}"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Low defaults
    // -----------------------------------------------------------------------

    #[test]
    fn test_reads_and_sends_are_low() {
        let registry = MethodRegistry::standard();
        for method in ["getMe", "getChat", "getUpdates", "sendMessage", "sendPhoto", "answerCallbackQuery"] {
            assert_eq!(
                registry.lookup(method).unwrap().risk,
                RiskLevel::Low,
                "{method}"
            );
        }
        assert_eq!(
            registry.lookup("getChat").unwrap().family,
            MethodFamily::Query
        );
    }

    #[test]
    fn test_global_registry_is_shared() {
        let a = MethodRegistry::global();
        let b = MethodRegistry::global();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a.len(), KNOWN_METHODS.len());
    }
}
