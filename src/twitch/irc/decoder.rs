use std::collections::HashMap;

use crate::chat::models::{Badge, TwitchEmote};

const ACTION_PREFIX: &str = "\u{1}ACTION";
const ACTION_SUFFIX: char = '\u{1}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Privmsg,
    Notice,
    ClearMsg,
    ClearChat,
    UserNotice,
    RoomState,
    UserState,
    GlobalUserState,
    Ping,
    Reconnect,
    Welcome,
    Unknown,
}

impl LineKind {
    fn from_command(command: &str) -> Self {
        match command {
            "PRIVMSG" => LineKind::Privmsg,
            "NOTICE" => LineKind::Notice,
            "CLEARMSG" => LineKind::ClearMsg,
            "CLEARCHAT" => LineKind::ClearChat,
            "USERNOTICE" => LineKind::UserNotice,
            "ROOMSTATE" => LineKind::RoomState,
            "USERSTATE" => LineKind::UserState,
            "GLOBALUSERSTATE" => LineKind::GlobalUserState,
            "PING" => LineKind::Ping,
            "RECONNECT" => LineKind::Reconnect,
            "001" => LineKind::Welcome,
            _ => LineKind::Unknown,
        }
    }
}

/// A key without a value, or with an empty one, maps to `None`. When a key
/// repeats, the last occurrence wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(HashMap<String, Option<String>>);

impl Tags {
    pub fn parse(block: &str) -> Self {
        let map = split_pairs(block, ';', '=')
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.map(str::to_string)))
            .collect();
        Tags(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct DecodedLine<'a> {
    pub raw: &'a str,
    pub tags: Tags,
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub kind: LineKind,
    pub remainder: &'a str,
}

impl<'a> DecodedLine<'a> {
    pub fn nick(&self) -> Option<&'a str> {
        self.prefix.map(|p| p.split('!').next().unwrap_or(p))
    }

    /// Text after the second `:` of the remainder. The first one opens the source prefix.
    pub fn body(&self) -> Option<&'a str> {
        let first = self.remainder.find(':')?;
        let second = self.remainder[first + 1..].find(':')? + first + 1;
        Some(&self.remainder[second + 1..])
    }

    pub fn trailing(&self) -> Option<&'a str> {
        self.remainder.find(" :").map(|i| &self.remainder[i + 2..])
    }
}

pub fn decode(line: &str) -> Option<DecodedLine<'_>> {
    let raw = line.trim_end_matches(['\r', '\n']);
    if raw.trim().is_empty() {
        return None;
    }

    let (tags, remainder) = match raw.strip_prefix('@') {
        Some(rest) => match rest.split_once(' ') {
            Some((block, remainder)) => (Tags::parse(block), remainder),
            None => (Tags::parse(rest), ""),
        },
        None => (Tags::default(), raw),
    };

    let mut words = remainder.split(' ');
    let (prefix, command) = if remainder.starts_with(':') {
        let prefix = words.next().map(|p| &p[1..]);
        (prefix, words.next().unwrap_or(""))
    } else {
        (None, words.next().unwrap_or(""))
    };

    Some(DecodedLine {
        raw,
        tags,
        prefix,
        command,
        kind: LineKind::from_command(command),
        remainder,
    })
}

pub fn split_pairs(input: &str, item_sep: char, kv_sep: char) -> Vec<(&str, Option<&str>)> {
    input
        .split(item_sep)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once(kv_sep) {
            Some((key, value)) if !value.is_empty() => (key, Some(value)),
            Some((key, _)) => (key, None),
            None => (item, None),
        })
        .collect()
}

pub fn parse_emotes(value: &str) -> Vec<TwitchEmote> {
    let mut emotes = Vec::new();
    for (id, ranges) in split_pairs(value, '/', ':') {
        let Some(ranges) = ranges else { continue };
        for range in ranges.split(',') {
            let Some((start, end)) = range.split_once('-') else { continue };
            if let (Ok(start), Ok(end)) = (start.parse::<usize>(), end.parse::<usize>()) {
                emotes.push(TwitchEmote::new(id, start, end));
            }
        }
    }
    emotes
}

pub fn parse_badges(value: &str) -> Vec<Badge> {
    split_pairs(value, ',', '/')
        .into_iter()
        .filter_map(|(set, version)| version.map(|v| Badge::new(set, v)))
        .collect()
}

pub fn strip_action(body: &str) -> (&str, bool) {
    match body.strip_prefix(ACTION_PREFIX) {
        Some(inner) => {
            let inner = inner.strip_prefix(' ').unwrap_or(inner);
            (inner.strip_suffix(ACTION_SUFFIX).unwrap_or(inner), true)
        }
        None => (body, false),
    }
}

pub fn unescape_spaces(value: &str) -> String {
    value.replace("\\s", " ")
}
