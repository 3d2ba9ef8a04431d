use crate::commands::{CmdMessage, CmdResult};
use crate::config::IndexConfig;
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
}

pub fn run(config: &IndexConfig, action: ConfigAction) -> Result<CmdResult> {
    match action {
        ConfigAction::ShowAll => Ok(CmdResult::default().with_config(config.clone())),
        ConfigAction::ShowKey(key) => {
            let mut result = CmdResult::default();
            match config.get(&key) {
                Some(val) => result.add_message(CmdMessage::info(val)),
                None => {
                    result.add_message(CmdMessage::error(format!("Unknown config key: {}", key)))
                }
            }
            Ok(result)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_all_returns_the_config() {
        let result = run(&IndexConfig::default(), ConfigAction::ShowAll).unwrap();
        assert_eq!(result.config.unwrap().index_start_row, 5);
    }

    #[test]
    fn show_key() {
        let config = IndexConfig {
            root: Some("abc".to_string()),
            ..Default::default()
        };
        let result = run(&config, ConfigAction::ShowKey("root".to_string())).unwrap();
        assert_eq!(result.messages[0].content, "abc");

        let result = run(&config, ConfigAction::ShowKey("cache_start_row".to_string())).unwrap();
        assert_eq!(result.messages[0].content, "2");
    }

    #[test]
    fn unknown_key_is_an_error_message() {
        let result = run(&IndexConfig::default(), ConfigAction::ShowKey("nope".into())).unwrap();
        assert!(result.messages[0].content.contains("Unknown config key"));
    }
}
