//! Deterministic replies used when no completion is available.

pub const EMPTY_REPLY: &str = "Say something and I will try to help.";

pub const FALLBACK_REPLY: &str =
    "I'm not sure how to help with that. Try asking for 'domains', 'links', or 'help'.";

/// Keyword rules in priority order; the first rule with any matching
/// keyword wins.
const RULES: &[(&[&str], &str)] = &[
    (
        &["domain"],
        "Primary domains: https://mrrainbowsmoke.com, https://blog.mrrainbowsmoke.com, https://projects.mrrainbowsmoke.com.",
    ),
    (
        &["links", "link"],
        "Try: /, https://mrrainbowsmoke.com, https://github.com/rainbowkillah",
    ),
    (
        &["hello", "hi", "hey"],
        "Hi! I can list domains or give a short description. Ask: \"What domains do you have?\"",
    ),
    (
        &["help"],
        "You can ask: \"What domains do you have?\", \"Where is your blog?\", or \"Who are you?\"",
    ),
    (
        &["who", "you"],
        "I am a tiny virtual assistant running inside this Cloudflare Worker. I can show links and basic info.",
    ),
];

/// Reply for `message` by case-insensitive substring match.
pub fn rule_reply(message: &str) -> &'static str {
    let text = message.trim().to_lowercase();
    if text.is_empty() {
        return EMPTY_REPLY;
    }

    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map_or(FALLBACK_REPLY, |(_, reply)| reply)
}
