//! Configuration management command.

use crate::Result;
use crate::cli::{ConfigAction, ConfigArgs};
use crate::cli::ui::print_success;
use crate::config::ConfigService;
use crate::config::service::KNOWN_KEYS;

/// Execute a configuration operation.
pub fn execute(args: ConfigArgs, config_service: &dyn ConfigService) -> Result<()> {
    match args.action {
        ConfigAction::Set { key, value } => {
            config_service.set_config_value(&key, &value)?;
            print_success(&format!("{} = {}", key, value));
        }
        ConfigAction::Get { key } => {
            println!("{}", config_service.get_config_value(&key)?);
        }
        ConfigAction::List => {
            for key in KNOWN_KEYS {
                println!("{} = {}", key, config_service.get_config_value(key)?);
            }
        }
        ConfigAction::Reset => {
            config_service.reset_to_defaults()?;
            print_success("configuration reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", config_service.config_file_path()?.display());
        }
    }
    Ok(())
}
