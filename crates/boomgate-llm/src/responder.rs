//! Local fallback responder.
//!
//! When every provider fails the caller still gets an answer: a canned reply
//! picked by keyword bucket. Replies are in Russian when the message
//! contains Cyrillic, in English otherwise.

use rand::seq::SliceRandom;

use crate::classifier::{keyword_matches, tokenize};

/// Keyword bucket of a message, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// "hi", "привет".
    Greeting,
    /// "what can you do", "кто ты".
    Capability,
    /// "weather", "погода".
    Weather,
    /// "time", "который час".
    Time,
    /// "code", "программир".
    Coding,
    /// Anything else.
    General,
}

struct BucketRule {
    bucket: Bucket,
    keywords: &'static [&'static str],
}

const RULES: &[BucketRule] = &[
    BucketRule {
        bucket: Bucket::Greeting,
        keywords: &[
            "привет",
            "здравствуй",
            "добрый день",
            "добрый вечер",
            "доброе утро",
            "хай",
            "hello",
            "hi",
            "hey",
            "good morning",
            "good evening",
        ],
    },
    BucketRule {
        bucket: Bucket::Capability,
        keywords: &[
            "что ты умеешь",
            "кто ты",
            "что ты можешь",
            "твои возможности",
            "what can you do",
            "who are you",
            "what are you",
            "your capabilities",
        ],
    },
    BucketRule {
        bucket: Bucket::Weather,
        keywords: &[
            "погод",
            "температур",
            "осадк",
            "weather",
            "temperature",
            "forecast",
            "rain",
        ],
    },
    BucketRule {
        bucket: Bucket::Time,
        keywords: &[
            "время",
            "который час",
            "дата",
            "какое число",
            "time",
            "date",
            "what day",
            "clock",
        ],
    },
    BucketRule {
        bucket: Bucket::Coding,
        keywords: &[
            "код",
            "программир",
            "разработ",
            "javascript",
            "python",
            "code",
            "coding",
            "programming",
        ],
    },
];

const GREETING_EN: &[&str] = &[
    "Hello! I'm an AI assistant. How can I help you today?",
    "Hi there! What would you like to talk about?",
    "Good to see you! Ask me anything.",
];
const GREETING_RU: &[&str] = &[
    "Привет! Я AI-ассистент. Чем могу помочь?",
    "Здравствуйте! О чём хотите поговорить?",
    "Рад вас видеть! Задавайте любой вопрос.",
];
const CAPABILITY_EN: &[&str] = &[
    "I can answer questions, explain concepts, help with code and draft texts. \
     Right now I'm running in offline mode, so my answers are limited.",
];
const CAPABILITY_RU: &[&str] = &[
    "Я умею отвечать на вопросы, объяснять понятия, помогать с кодом и писать тексты. \
     Сейчас я работаю в автономном режиме, поэтому ответы ограничены.",
];
const WEATHER_EN: &[&str] = &[
    "I don't have access to live weather data. A dedicated weather service will give you an accurate forecast.",
    "I can't check the current weather without an internet connection. Try a weather app or website.",
];
const WEATHER_RU: &[&str] = &[
    "У меня нет доступа к актуальным данным о погоде. Точный прогноз подскажет специализированный сервис.",
    "Без подключения к интернету я не могу узнать текущую погоду. Попробуйте приложение прогноза погоды.",
];
const CODING_EN: &[&str] = &[
    "Programming is the craft of turning ideas into instructions a computer can run. \
     Popular languages include Python, JavaScript, Rust and Go.",
    "A typical web stack uses HTML, CSS and JavaScript on the frontend and a language \
     such as Python, Go or Node.js on the backend.",
];
const CODING_RU: &[&str] = &[
    "Программирование превращает идеи в инструкции, которые выполняет компьютер. \
     Популярные языки: Python, JavaScript, Rust и Go.",
    "Типичный веб-стек: HTML, CSS и JavaScript на фронтенде и Python, Go или Node.js на бэкенде.",
];
const GENERAL_EN: &[&str] = &[
    "Interesting question. I'm answering locally right now, without access to fresh information from the internet.",
    "I'm looking at your request and will share what I know, though my sources are limited at the moment.",
    "That's an interesting topic! I can give general information, but for specific or current details a specialised resource is a better bet.",
];
const GENERAL_RU: &[&str] = &[
    "Интересный вопрос. Сейчас я отвечаю локально, без доступа к свежей информации из интернета.",
    "Я разбираю ваш запрос и поделюсь тем, что знаю, хотя мои источники сейчас ограничены.",
    "Интересная тема! Могу рассказать в общих чертах, но за точными и свежими данными лучше обратиться к профильным ресурсам.",
];

/// Produces canned replies when no provider succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResponder;

impl LocalResponder {
    /// Create a responder.
    pub fn new() -> Self {
        Self
    }

    /// Which bucket `message` falls into.
    pub fn bucket(&self, message: &str) -> Bucket {
        let lower = message.to_lowercase();
        let tokens = tokenize(&lower);
        RULES
            .iter()
            .find(|rule| {
                rule.keywords
                    .iter()
                    .any(|kw| keyword_matches(&lower, &tokens, kw))
            })
            .map(|rule| rule.bucket)
            .unwrap_or(Bucket::General)
    }

    /// A canned reply for `message`. Never empty.
    pub fn respond(&self, message: &str) -> String {
        let russian = message.chars().any(is_cyrillic);
        let bucket = self.bucket(message);

        if bucket == Bucket::Time {
            let now = chrono::Local::now().format("%H:%M:%S %d.%m.%Y");
            return if russian {
                format!("Сейчас {now} по времени сервера. Оно может отличаться от вашего местного времени.")
            } else {
                format!("It is {now} server time. This may differ from your local time.")
            };
        }

        let pool = match (bucket, russian) {
            (Bucket::Greeting, false) => GREETING_EN,
            (Bucket::Greeting, true) => GREETING_RU,
            (Bucket::Capability, false) => CAPABILITY_EN,
            (Bucket::Capability, true) => CAPABILITY_RU,
            (Bucket::Weather, false) => WEATHER_EN,
            (Bucket::Weather, true) => WEATHER_RU,
            (Bucket::Coding, false) => CODING_EN,
            (Bucket::Coding, true) => CODING_RU,
            (_, false) => GENERAL_EN,
            (_, true) => GENERAL_RU,
        };

        pool.choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(GENERAL_EN[0])
            .to_owned()
    }
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

/// Split `text` into at most `groups` word groups for simulated streaming.
///
/// Every group but the last carries a trailing space, so the groups
/// concatenate to the words of `text` joined by single spaces.
pub fn word_groups(text: &str, groups: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let per_group = words.len().div_ceil(groups.max(1));
    let chunks: Vec<&[&str]> = words.chunks(per_group).collect();
    let last = chunks.len() - 1;
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let mut s = chunk.join(" ");
            if i < last {
                s.push(' ');
            }
            s
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_in_priority_order() {
        let r = LocalResponder::new();
        assert_eq!(r.bucket("Hello!"), Bucket::Greeting);
        assert_eq!(r.bucket("Привет, какая погода?"), Bucket::Greeting);
        assert_eq!(r.bucket("What can you do?"), Bucket::Capability);
        assert_eq!(r.bucket("Какая сегодня погода?"), Bucket::Weather);
        assert_eq!(r.bucket("What time is it?"), Bucket::Time);
        assert_eq!(r.bucket("Помоги с кодом"), Bucket::Coding);
        assert_eq!(r.bucket("Tell me about whales"), Bucket::General);
        assert_eq!(r.bucket(""), Bucket::General);
    }

    #[test]
    fn short_keywords_need_whole_token() {
        let r = LocalResponder::new();
        // "hi" inside "this", "rain" inside "brain"
        assert_eq!(r.bucket("this brain"), Bucket::General);
    }

    #[test]
    fn keywords_inside_words_do_not_match() {
        let r = LocalResponder::new();
        // "дата" inside "кандидата", "clock" inside "unclocked"
        assert_eq!(r.bucket("Расскажи про кандидата"), Bucket::General);
        assert_eq!(r.bucket("unclocked hours"), Bucket::General);
        assert_eq!(r.bucket("Какая сегодня дата?"), Bucket::Time);
    }

    #[test]
    fn replies_are_non_empty() {
        let r = LocalResponder::new();
        for msg in [
            "",
            "hi",
            "привет",
            "who are you",
            "кто ты",
            "weather",
            "погода",
            "time",
            "время",
            "python code",
            "код",
            "anything else",
            "что-то ещё",
            "<html>",
        ] {
            assert!(!r.respond(msg).trim().is_empty(), "empty reply for {msg:?}");
        }
    }

    #[test]
    fn language_follows_message() {
        let r = LocalResponder::new();
        assert!(r.respond("привет").chars().any(is_cyrillic));
        assert!(!r.respond("hello").chars().any(is_cyrillic));
    }

    #[test]
    fn time_reply_uses_clock() {
        let r = LocalResponder::new();
        let year = chrono::Local::now().format("%Y").to_string();
        assert!(r.respond("what time is it").contains(&year));
        assert!(r.respond("который час?").contains("Сейчас"));
    }

    #[test]
    fn word_groups_concatenate_to_text() {
        let text = "one two three four five six seven eight nine ten eleven";
        let groups = word_groups(text, 5);
        assert!(groups.len() <= 5);
        assert_eq!(groups.concat(), text);
        assert!(!groups.last().unwrap().ends_with(' '));
    }

    #[test]
    fn word_groups_fewer_words_than_groups() {
        assert_eq!(word_groups("just two", 5), vec!["just ", "two"]);
        assert_eq!(word_groups("single", 3), vec!["single"]);
        assert!(word_groups("   ", 3).is_empty());
    }

    #[test]
    fn word_groups_zero_groups_is_one() {
        assert_eq!(word_groups("a b c", 0), vec!["a b c"]);
    }
}
