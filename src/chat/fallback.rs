//! Offline chat responder.
//!
//! Keyword-routed canned answers for when AI generation is unavailable.
//! First matching topic wins; anything unmatched gets the general answer.

use std::sync::LazyLock;

use regex::Regex;

/// A keyword pattern and the answer it routes to.
struct Topic {
    name: &'static str,
    regex: Regex,
    response: &'static str,
}

/// Ordered topic table. Urgent symptoms are checked before everything else.
static TOPICS: LazyLock<Vec<Topic>> = LazyLock::new(|| {
    vec![
        topic(
            "urgent",
            r"(?i)\b(?:faint(?:ed|ing)?|pass(?:ed|ing)\s+out|soak(?:ed|ing)?\s+(?:through\s+)?(?:a\s+)?(?:pad|tampon)s?|fever|emergency|severe\s+bleeding|can'?t\s+stand)\b",
            "Some of what you describe can need prompt medical attention. Fainting, a fever during your period, or soaking through a pad or tampon every hour for several hours are reasons to contact a healthcare provider or urgent care right away. If you feel unsafe or your symptoms are severe, please call your local emergency number.",
        ),
        topic(
            "pain",
            r"(?i)\b(?:pain(?:ful)?|cramp(?:s|ing)?|ache|aches|aching|hurts?|dysmenorrhea)\b",
            "Period pain and cramps are common, and there are several things that can help. Gentle heat on your lower abdomen, light movement such as walking or stretching, and staying hydrated often bring relief. Over-the-counter pain relievers taken as directed can also help. If your pain regularly stops you from doing daily activities, or is getting worse over time, please discuss it with your healthcare provider. Logging pain levels each day makes that conversation much easier.",
        ),
        topic(
            "mood",
            r"(?i)\b(?:mood(?:s|y)?|anxi(?:ous|ety)|depress(?:ed|ion)|sad|irritab(?:le|ility)|emotional|pmdd|pms|stress(?:ed)?)\b",
            "Mood changes across the cycle are common and are linked to shifting hormonal levels. Regular sleep, movement, and small acts of self-care can help. If mood changes feel severe, last most of the month, or affect your relationships or work, they are worth raising with your healthcare provider, since conditions like PMDD are treatable. Tracking your mood alongside your cycle can show whether the changes follow a pattern.",
        ),
        topic(
            "sleep_energy",
            r"(?i)\b(?:sleep(?:ing)?|insomnia|tired(?:ness)?|fatigue(?:d)?|exhausted|energy)\b",
            "Sleep and energy often shift around your period. Keeping a consistent bedtime, limiting caffeine later in the day, and gentle exercise can help. Iron-rich foods may be useful if you have heavy periods. If fatigue is persistent or severe, ask your healthcare provider whether checking iron levels makes sense. Logging sleep hours and energy each day helps spot patterns.",
        ),
        topic(
            "flow",
            r"(?i)\b(?:flow|bleed(?:ing)?|heavy|spotting|clots?|pads?|tampons?)\b",
            "Flow varies from person to person and from cycle to cycle. If you regularly need to change protection every hour or two, pass large clots, or bleed for more than seven days, let your healthcare provider know, since heavy bleeding can lead to low iron. Recording your flow level each day gives a clear picture to share at your next appointment.",
        ),
        topic(
            "cycle",
            r"(?i)\b(?:cycles?|periods?|menstrua(?:l|tion)|late|irregular|regular|ovulat(?:e|ion|ing))\b",
            "A typical menstrual cycle lasts between 21 and 35 days, counted from the first day of one period to the first day of the next. Some variation from month to month is normal. If your cycles are often shorter than 21 days, longer than 35 days, or change a lot, it is worth discussing with your healthcare provider. Logging the start date of each period helps you see how regular your cycle is.",
        ),
    ]
});

/// Answer for messages that match no topic.
pub const DEFAULT_RESPONSE: &str = "Thanks for your question. I can share general information about menstrual health, including cycle patterns, pain, mood, sleep, and flow. Tracking your symptoms each day helps build a picture you can share with your healthcare provider, who can give advice specific to you. Is there a particular symptom you would like to talk about?";

fn topic(name: &'static str, regex_str: &str, response: &'static str) -> Topic {
    Topic {
        name,
        regex: Regex::new(regex_str).expect("Invalid chat topic pattern"),
        response,
    }
}

/// Canned answer for `message`. Never empty, never touches the network.
pub fn respond(message: &str) -> &'static str {
    match TOPICS.iter().find(|t| t.regex.is_match(message)) {
        Some(topic) => {
            tracing::debug!(topic = topic.name, "Offline chat topic matched");
            topic.response
        }
        None => DEFAULT_RESPONSE,
    }
}
