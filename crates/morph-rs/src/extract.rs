//! Fenced code block extraction from free-text model replies.
//!
//! A block opens with three backticks and an optional language tag running
//! to the end of the line, and closes with a newline followed by three
//! backticks. Matching is non-greedy, so a reply may hold several blocks.
//! A reply without blocks is a valid outcome and yields an empty list.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

// The opening fence need not start its line.
static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(.*?)\n(.*?)\n```").expect("fence pattern is a valid regex")
});

/// One fenced block pulled out of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Text following the opening fence on the same line, e.g. `rust`.
    /// Empty when the fence carries no tag.
    pub language: String,
    pub body: String,
}

/// Extract every fenced block from `reply`, in order of appearance.
pub fn extract_code_blocks(reply: &str) -> Vec<CodeBlock> {
    FENCE
        .captures_iter(reply)
        .map(|caps| CodeBlock {
            language: caps
                .get(1)
                .map_or("", |m| m.as_str())
                .trim()
                .to_string(),
            body: caps.get(2).map_or("", |m| m.as_str()).to_string(),
        })
        .collect()
}

/// How a reply with several blocks becomes one file body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlockPolicy {
    /// Keep only the last block.
    #[default]
    Last,
    /// Join all block bodies, separated by a blank line.
    Concatenate,
}

impl BlockPolicy {
    /// The body to persist, or `None` when there are no blocks.
    pub fn select(&self, blocks: &[CodeBlock]) -> Option<String> {
        match self {
            BlockPolicy::Last => blocks.last().map(|b| b.body.clone()),
            BlockPolicy::Concatenate if blocks.is_empty() => None,
            BlockPolicy::Concatenate => Some(
                blocks
                    .iter()
                    .map(|b| b.body.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            ),
        }
    }
}

impl FromStr for BlockPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "last" => Ok(BlockPolicy::Last),
            "concat" | "concatenate" => Ok(BlockPolicy::Concatenate),
            other => Err(format!(
                "unknown block policy '{other}' (expected 'last' or 'concat')"
            )),
        }
    }
}

impl std::fmt::Display for BlockPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockPolicy::Last => write!(f, "last"),
            BlockPolicy::Concatenate => write!(f, "concat"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tagged_block() {
        let reply = "Here you go:\n```python\nprint('hi')\n```\nEnjoy.";
        let blocks = extract_code_blocks(reply);
        assert_eq!(
            blocks,
            vec![CodeBlock {
                language: "python".into(),
                body: "print('hi')".into(),
            }]
        );
    }

    #[test]
    fn untagged_block_has_empty_language() {
        let blocks = extract_code_blocks("```\nX\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "");
        assert_eq!(blocks[0].body, "X");
    }

    #[test]
    fn multiline_body_is_preserved() {
        let reply = "```rust\nfn main() {\n    println!(\"hi\");\n}\n```";
        let blocks = extract_code_blocks(reply);
        assert_eq!(blocks[0].body, "fn main() {\n    println!(\"hi\");\n}");
    }

    #[test]
    fn multiple_blocks_are_matched_non_greedily() {
        let reply = "First:\n```js\na()\n```\nthen\n```css\nb {}\n```\n";
        let blocks = extract_code_blocks(reply);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "js");
        assert_eq!(blocks[0].body, "a()");
        assert_eq!(blocks[1].language, "css");
        assert_eq!(blocks[1].body, "b {}");
    }

    #[test]
    fn fence_opening_mid_line_is_accepted() {
        let blocks = extract_code_blocks("Here it is: ```sh\nls -la\n```");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].language, "sh");
        assert_eq!(blocks[0].body, "ls -la");
    }

    #[test]
    fn reply_without_fences_yields_nothing() {
        assert!(extract_code_blocks("I cannot help with that.").is_empty());
        assert!(extract_code_blocks("").is_empty());
    }

    #[test]
    fn unterminated_fence_is_ignored() {
        assert!(extract_code_blocks("```rust\nfn main() {}\n").is_empty());
    }

    #[test]
    fn last_policy_keeps_final_block() {
        let blocks = extract_code_blocks("```\nA\n```\n```\nB\n```");
        assert_eq!(BlockPolicy::Last.select(&blocks).as_deref(), Some("B"));
        assert_eq!(BlockPolicy::Last.select(&[]), None);
    }

    #[test]
    fn concatenate_policy_joins_bodies() {
        let blocks = extract_code_blocks("```\nA\n```\n```\nB\n```");
        assert_eq!(
            BlockPolicy::Concatenate.select(&blocks).as_deref(),
            Some("A\n\nB")
        );
        assert_eq!(BlockPolicy::Concatenate.select(&[]), None);
    }

    #[test]
    fn block_policy_parses() {
        assert_eq!("last".parse::<BlockPolicy>(), Ok(BlockPolicy::Last));
        assert_eq!("CONCAT".parse::<BlockPolicy>(), Ok(BlockPolicy::Concatenate));
        assert!("first".parse::<BlockPolicy>().is_err());
        assert_eq!(BlockPolicy::Concatenate.to_string(), "concat");
    }
}
