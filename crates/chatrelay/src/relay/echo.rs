//! Deterministic local reply used when no provider is wired in.

/// Build the echo reply for `message`.
///
/// Pure: the same message always yields the same text.
pub fn reply(message: &str) -> String {
    format!(
        "Echo: {message}\n\n\
         This is a demo response. To connect a real model:\n\
         1. Set GEMINI_API_KEY in your environment or .env file\n\
         2. Set provider.mode to \"gemini\" in chatrelay.yaml (or drop --echo)\n\
         3. Restart the server"
    )
}
