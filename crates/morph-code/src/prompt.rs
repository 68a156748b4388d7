//! Everything the bot says, and the messages it sends to the model.
//!
//! Every reply starts with [`PREFIX`].

use morph_rs::Message;
use morph_rs::transport::Menu;

use crate::config::MorphConfig;

pub const PREFIX: &str = "mrph>";

pub const MAIN_MENU_TEXT: &str = "mrph> Welcome to the GPT Morph CLI Bot! You are currently in the main menu.
To execute a command, type the corresponding option and press Enter.
You can always return to the main menu by typing \"/start\".
Type \"/help\" for more.
";

pub const HELP_TEXT: &str = "mrph> Available commands:
/generate - Generate a new file for your project based on a human language description.
/patch - Update an existing file (re-factor) by prompting what the update should be.
/settings - Display your LLM settings.
/graph - Graphviz representation for this bot's API.
/help - Show this help page.
/exit - Close the application.";

pub const CONFIGURE_KEY: &str =
    "mrph> Please, configure the LLM API key as stated in \"/settings\".";
pub const ASK_GENERATE_FILE: &str = "mrph> Enter the file name for saving the generated file:";
pub const ASK_PATCH_FILE: &str = "mrph> Enter the file name to be patched:";
pub const GOODBYE: &str = "mrph> Bye!";
pub const EMPTY_FILE_NAME: &str = "mrph> The file name cannot be empty. Enter a file name:";

const OPENAI_KEY_GUIDE: &str = "--------------------------------------------------
    HOW TO GET OPENAI API KEY?

Please set your OpenAI API key by following these steps:

1. Create a file named \".env\" in the project folder.
2. Open the .env file and add the following line:
      OPENAI_API_KEY=<YOUR_API_KEY>
   Replace <YOUR_API_KEY> with your actual OpenAI API key.

   If you don't have an API key yet, sign up at https://platform.openai.com/signup

3. Save the .env file.

Once the OpenAI API key is added, you can proceed with running the program.

--------------------------------------------------
";

const CLAUDE_GUIDE: &str = "--------------------------------------------------
    HOW TO GET Claude (Anthropic) API KEY?

Claude official API is not for all.
Therefore, we are using the Web API for accessing Claude:

1. Save your https://claude.ai/ session cookie to a file.
2. Start the bot with \"--cookie-file <FILE>\" (or set CLAUDE_COOKIE in .env).
3. Type \"/authenticate_claude\".

--------------------------------------------------
";

const CLAUDE_AUTHENTICATED: &str =
    "Your Claude (Anthropic) session: authenticated (cookie hidden)\n\n";

pub fn main_menu() -> Menu {
    Menu::new([
        vec!["Generate", "Patch"],
        vec!["Settings", "Help", "Exit"],
        vec!["Graph"],
    ])
}

pub fn settings_menu() -> Menu {
    Menu::row(["Start", "Authenticate Claude", "Exit"])
}

/// Configured keys, followed by setup guidance for each missing one.
/// An authenticated Claude session counts as configured and is never shown.
pub fn settings_text(config: &MorphConfig, claude_authenticated: bool) -> String {
    let mut text = String::from("mrph>\n");
    let mut guidance = String::new();

    match &config.api_key {
        Some(key) => text.push_str(&format!("Your OpenAI API key (.env): \"{key}\"\n\n")),
        None => guidance.push_str(OPENAI_KEY_GUIDE),
    }
    match &config.claude_cookie {
        _ if claude_authenticated => text.push_str(CLAUDE_AUTHENTICATED),
        Some(cookie) => {
            text.push_str(&format!("Your Claude (Anthropic) API key (.env): \"{cookie}\"\n\n"))
        }
        None => guidance.push_str(CLAUDE_GUIDE),
    }

    text.push_str(&format!(
        "Model: {}\nEndpoint: {}\nWord budget: {}\nBlock policy: {}\n\n",
        config.model, config.base_url, config.word_budget, config.block_policy
    ));
    text.push_str(&guidance);
    text
}

pub fn will_create(file_name: &str) -> String {
    format!(
        "mrph> Ok, I will create a file \"{file_name}\" when finished. What should be in this file?"
    )
}

pub fn directory_file_name(file_name: &str) -> String {
    format!("mrph> \"{file_name}\" is a directory. Enter the name of a file instead:")
}

pub fn loaded(file_name: &str) -> String {
    format!("mrph> Loaded \"{file_name}\". How to augment that?")
}

pub fn saved(file_name: &str) -> String {
    format!("mrph> Your \"{file_name}\" file was saved.")
}

pub fn augmented(file_name: &str) -> String {
    format!("mrph> File \"{file_name}\" has been augmented based on your prompt.")
}

pub fn processing_error(error: &dyn std::fmt::Display) -> String {
    format!("mrph> An error occurred while processing the file: {error}")
}

pub fn authenticated() -> String {
    "mrph> Claude API authenticated.".to_string()
}

pub fn authentication_failed(error: &dyn std::fmt::Display) -> String {
    format!("mrph> Claude authentication failed: {error}")
}

/// Note appended to a completion reply when the model answered with more
/// than one fenced block.
pub fn several_blocks(count: usize, policy: morph_rs::extract::BlockPolicy) -> String {
    use morph_rs::extract::BlockPolicy;
    match policy {
        BlockPolicy::Last => {
            format!("mrph> The reply held {count} code blocks, only the last one was written.")
        }
        BlockPolicy::Concatenate => {
            format!("mrph> The reply held {count} code blocks, all of them were joined.")
        }
    }
}

pub fn no_blocks(file_name: &str) -> String {
    format!("mrph> The reply held no code block, \"{file_name}\" was left untouched.")
}

pub fn graph_text(dot: &str) -> String {
    format!("mrph> Graphviz source for this bot:\n{dot}")
}

/// History for a generate request: the description alone.
pub fn generate_messages(description: &str) -> Vec<Message> {
    vec![Message::user(description)]
}

/// History for a patch request: the task, the current file, the change.
pub fn patch_messages(file_name: &str, contents: &str, description: &str) -> Vec<Message> {
    vec![
        Message::system(format!("Let's update the {file_name} file provided.")),
        Message::assistant(format!("Original file:\n\n---\n{contents}\n---\n")),
        Message::user(description),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_rs::MessageRole;
    use morph_rs::extract::BlockPolicy;

    #[test]
    fn every_reply_is_prefixed() {
        for text in [
            MAIN_MENU_TEXT.to_string(),
            HELP_TEXT.to_string(),
            CONFIGURE_KEY.to_string(),
            will_create("a.py"),
            loaded("a.py"),
            EMPTY_FILE_NAME.to_string(),
            directory_file_name("src"),
            saved("a.py"),
            augmented("a.py"),
            processing_error(&"boom"),
            several_blocks(2, BlockPolicy::Last),
            no_blocks("a.py"),
            settings_text(&MorphConfig::default(), false),
        ] {
            assert!(text.starts_with(PREFIX), "{text}");
        }
    }

    #[test]
    fn settings_show_guidance_only_for_missing_keys() {
        let config = MorphConfig {
            api_key: Some("sk-1".into()),
            ..Default::default()
        };
        let text = settings_text(&config, false);
        assert!(text.contains("Your OpenAI API key (.env): \"sk-1\""));
        assert!(!text.contains("HOW TO GET OPENAI API KEY?"));
        assert!(text.contains("HOW TO GET Claude (Anthropic) API KEY?"));
    }

    #[test]
    fn authenticated_claude_session_hides_cookie_and_guidance() {
        let config = MorphConfig {
            claude_cookie: Some("sessionKey=abc".into()),
            ..Default::default()
        };
        let text = settings_text(&config, true);
        assert!(text.contains("Claude (Anthropic) session: authenticated"));
        assert!(!text.contains("sessionKey=abc"));
        assert!(!text.contains("HOW TO GET Claude"));
    }

    #[test]
    fn patch_messages_wrap_original_contents() {
        let messages = patch_messages("lib.rs", "fn a() {}\n", "rename a to b");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, MessageRole::System);
        assert_eq!(messages[0].content, "Let's update the lib.rs file provided.");
        assert_eq!(messages[1].role, MessageRole::Assistant);
        assert_eq!(messages[1].content, "Original file:\n\n---\nfn a() {}\n\n---\n");
        assert_eq!(messages[2], Message::user("rename a to b"));
    }

    #[test]
    fn main_menu_has_three_rows() {
        let menu = main_menu();
        assert_eq!(menu.rows().len(), 3);
        assert_eq!(menu.rows()[2], vec!["Graph"]);
    }
}
