//! Prompt text and fallback content for each companion capability.

use serde_json::{json, Value};
use shared::wellness::{CommunityPost, UserProfile};

pub const CHAT_FALLBACK: &str =
    "I'm having a little trouble connecting right now. Please try again in a moment.";

pub const SMART_REPLY_FALLBACK: [&str; 3] = [
    "Tell me more.",
    "Suggest a calming exercise.",
    "I just want to vent.",
];

pub const TIP_FALLBACK: &str = "Breathe deeply. Inhale for 4 seconds, hold for 4, and exhale for 6. This can help calm your nervous system.";

pub const AFFIRMATION_FALLBACK: &str = "I am worthy of peace and happiness.";

pub fn community_fallback() -> Vec<CommunityPost> {
    [
        ("BraveHeart", "Today, I reminded myself that it's okay to not be okay. Taking it one step at a time."),
        ("SunSeeker", "Managed to get out for a bit of sunshine. It's the small things that make a big difference!"),
        ("GrowthMindset", "Journaling has been a game-changer for me. Writing things down really helps clear my head."),
    ]
    .into_iter()
    .map(|(username, content)| CommunityPost {
        username: username.to_string(),
        content: content.to_string(),
    })
    .collect()
}

/// Persona and constraints for the chat assistant.
pub fn system_instruction(profile: &UserProfile, language: &str) -> String {
    format!(
        "You are Miro, a compassionate and supportive AI mental health companion. \
         The user's name is {name}, they are {age} years old and identify as {gender}. \
         Tailor your responses to be empathetic and relevant to their demographic. \
         Always keep your replies gentle, encouraging, and concise, under 4 sentences. \
         Do not give medical advice. Your purpose is to listen and provide a safe space. \
         Please respond ONLY in {language}.",
        name = profile.name,
        age = profile.age,
        gender = profile.gender,
    )
}

pub fn smart_replies_prompt(last_ai_message: &str, language: &str) -> String {
    format!(
        "Based on the last AI response, suggest three short, distinct, and supportive follow-up \
         phrases a user might say. The last AI response was: \"{last_ai_message}\". \
         Respond in a JSON array of strings, translated into {language}. Only return the JSON array."
    )
}

pub fn sentiment_prompt(entry: &str) -> String {
    format!(
        "Analyze the sentiment of this journal entry. Is it primarily positive, or negative? \
         Respond with only the single word \"positive\" or \"negative\". Entry: \"{entry}\""
    )
}

pub fn crisis_prompt(message: &str) -> String {
    format!(
        "Analyze the following user message for any indication of self-harm or immediate \
         life-threatening crisis. Respond with only the single word \"true\" if it is a crisis, \
         and \"false\" otherwise. Do not provide any explanation. Message: \"{message}\""
    )
}

pub fn tip_prompt(language: &str) -> String {
    format!("Generate a short, practical mental wellness tip (2-3 sentences) in {language}.")
}

pub fn affirmation_prompt(language: &str) -> String {
    format!("Generate a positive daily affirmation (1 sentence) in {language}.")
}

pub fn community_prompt(language: &str) -> String {
    format!(
        "Generate 5 short, anonymous, uplifting community posts about mental wellness wins in {language}. \
         Examples: \"I went for a walk today even when I didn't feel like it.\", \
         \"I practiced deep breathing and it helped me calm down.\". \
         Respond in a JSON array of objects, where each object has a \"username\" \
         (a positive, generic name like 'HopefulSoul' or 'QuietAchiever') and \"content\" key."
    )
}

pub fn string_array_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": { "type": "STRING" }
    })
}

pub fn community_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "username": { "type": "STRING" },
                "content": { "type": "STRING" }
            }
        }
    })
}
