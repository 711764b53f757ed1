//! Interactive command parsing for the CLI.

use anyhow::{anyhow, bail, Context, Result};
use shared::{ContentRating, MediaType, TopFilter};

pub const HELP: &str = "\
Commands:
  search <text>      search by title (empty text browses the top list)
  clear              clear the search text
  page <n>           go to page n
  next | prev        move one page forward or back
  type <value|->     media type: tv movie ova special ona music cm pv tv_special
  filter <value|->   top list: airing upcoming bypopularity favorite
  rating <value|->   rating: g pg pg13 r17 r rx
  sfw on|off         safe-for-work only
  detail <id>        show one title
  recs               show recommendations
  state              show the current page again
  help               show this help
  quit               exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Clear,
    Page(u32),
    Next,
    Prev,
    Type(Option<MediaType>),
    Filter(Option<TopFilter>),
    Rating(Option<ContentRating>),
    Sfw(bool),
    Detail(u32),
    Recs,
    State,
    Help,
    Quit,
}

impl std::str::FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "search" | "s" => Command::Search(rest.to_string()),
            "clear" => Command::Clear,
            "page" | "p" => Command::Page(
                rest.parse()
                    .with_context(|| format!("Invalid page number: {:?}", rest))?,
            ),
            "next" | "n" => Command::Next,
            "prev" => Command::Prev,
            "type" => Command::Type(optional(rest)?),
            "filter" => Command::Filter(optional(rest)?),
            "rating" => Command::Rating(optional(rest)?),
            "sfw" => Command::Sfw(match rest.to_lowercase().as_str() {
                "on" | "true" | "yes" => true,
                "off" | "false" | "no" => false,
                other => bail!("Expected on or off, got {:?}", other),
            }),
            "detail" | "d" => Command::Detail(
                rest.parse()
                    .with_context(|| format!("Invalid anime id: {:?}", rest))?,
            ),
            "recs" => Command::Recs,
            "state" => Command::State,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            "" => bail!("Empty command"),
            other => return Err(anyhow!("Unknown command: {} (try help)", other)),
        };

        Ok(command)
    }
}

/// "-", "none" or nothing clears a facet
fn optional<T>(value: &str) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    match value.to_lowercase().as_str() {
        "" | "-" | "none" | "any" => Ok(None),
        _ => value.parse().map(Some),
    }
}
