#[cfg(test)]
pub mod test {
    use std::collections::VecDeque;

    use toml::{Table, Value};

    use crate::check::Rejection;
    use crate::crawl::value_at;
    use crate::error::ConfguardError;
    use crate::prompt::{PromptRequest, Prompter};

    /// A trimmed-down template in the shape real projects ship.
    pub const SAMPLE_TEMPLATE: &str = r#"
[reddit.creds]
client_id = { optional = false, nmin = 12, nmax = 30, explanation = "The ID of your Reddit app of SCRIPT type", example = "fFAGRNJru1FTz70BzhT3Zg", regex = "^[-a-zA-Z0-9._~+/]+=*$", input_error = "The client ID can only contain printable characters.", oob_error = "The ID should be over 12 and under 30 characters, double check your input." }
client_secret = { optional = false, nmin = 20, nmax = 40, regex = "^[-a-zA-Z0-9._~+/]+=*$" }
username = { optional = false, nmin = 3, nmax = 20, regex = "^[-_0-9a-zA-Z]+$" }
password = { optional = false, nmin = 8 }

[settings]
times_to_run = { optional = true, type = "int", nmin = 1, nmax = 10, default = 1 }

[settings.tts]
voice_choice = { optional = false, default = "tiktok", options = ["tiktok", "googletranslate", "elevenlabs"] }
"#;

    pub const VALID_CONFIG: &str = r#"
[reddit.creds]
client_id = "fFAGRNJru1FTz70BzhT3Zg"
client_secret = "abcdefghijklmnopqrstuvwxyz"
username = "bob_the_user"
password = "correct-horse"

[settings]
times_to_run = 2

[settings.tts]
voice_choice = "tiktok"
"#;

    pub fn valid_config() -> Table {
        toml::from_str(VALID_CONFIG).unwrap()
    }

    /// Prompter that replays canned answers and records what it was asked.
    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        answers: VecDeque<Value>,
        source: Option<Table>,
        confirm_answers: VecDeque<bool>,
        /// `(dotted key, reason)` for every `collect` call, in order.
        pub requests: Vec<(String, Rejection)>,
        /// Every confirmation message shown.
        pub confirmations: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: Vec<Value>) -> Self {
            Self {
                answers: answers.into(),
                ..Self::default()
            }
        }

        /// Answer each request with the value at the same key path in `source`.
        pub fn from_config(source: Table) -> Self {
            Self {
                source: Some(source),
                ..Self::default()
            }
        }

        pub fn confirming(mut self, answers: &[bool]) -> Self {
            self.confirm_answers = answers.iter().copied().collect();
            self
        }
    }

    impl Prompter for ScriptedPrompter {
        fn collect(&mut self, request: &PromptRequest<'_>) -> Result<Value, ConfguardError> {
            self.requests
                .push((request.key.to_string(), request.reason));
            let answer = match &self.source {
                Some(source) => {
                    let keys: Vec<&str> = request.key.split('.').collect();
                    value_at(source, &keys).cloned()
                }
                None => self.answers.pop_front(),
            };
            answer.ok_or_else(|| ConfguardError::InvalidValue {
                key: request.key.to_string(),
                reason: "script has no answer".into(),
            })
        }

        fn confirm(&mut self, message: &str) -> Result<bool, ConfguardError> {
            self.confirmations.push(message.to_string());
            Ok(self.confirm_answers.pop_front().unwrap_or(false))
        }
    }

    #[test]
    fn sample_config_matches_sample_template() {
        let template = crate::template::Template::parse(SAMPLE_TEMPLATE).unwrap();
        let mut config = valid_config();
        let summary =
            crate::validate::validate_tree(&template, &mut config, &mut crate::prompt::RefusingPrompter)
                .unwrap();
        assert_eq!(summary.prompts, 0);
    }
}
