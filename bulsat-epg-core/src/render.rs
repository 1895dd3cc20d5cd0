//! Rendering of the enriched channel set into an M3U playlist and an XMLTV guide.
//!
//! Both renderers are pure: same channels and blocked set in, same bytes out.
//! They share one genre predicate ([`is_blocked`]) and are otherwise
//! independent about what they list.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use quick_xml::escape::escape;

use crate::contract::Channel;

pub const PLAYLIST_HEADER: &str = "#EXTM3U";
/// Group used in the playlist when a channel has no genre.
pub const FALLBACK_GROUP: &str = "General";
pub const GUIDE_CHANNEL_LANG: &str = "bg";

/// Parses a comma separated genre list. Matching is exact and case-sensitive.
pub fn blocked_genres(csv: &str) -> BTreeSet<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// The single filter predicate shared by both documents.
pub fn is_blocked(channel: &Channel, blocked: &BTreeSet<String>) -> bool {
    channel
        .genre
        .as_deref()
        .is_some_and(|genre| blocked.contains(genre))
}

pub fn visible_channels<'a>(
    channels: &'a [Channel],
    blocked: &'a BTreeSet<String>,
) -> impl Iterator<Item = &'a Channel> + 'a {
    channels.iter().filter(move |c| !is_blocked(c, blocked))
}

pub fn render_playlist(channels: &[Channel], blocked: &BTreeSet<String>) -> String {
    let mut out = String::new();
    out.push_str(PLAYLIST_HEADER);
    out.push('\n');

    for channel in visible_channels(channels, blocked) {
        if channel.title.is_empty() || channel.sources.is_empty() {
            continue;
        }
        let group = channel.genre.as_deref().unwrap_or(FALLBACK_GROUP);
        let _ = writeln!(
            out,
            "#EXTINF:-1 tvg-id=\"{}\" tvg-name=\"{}\" tvg-logo=\"\" group-title=\"{}\",{}",
            attr(&channel.epg_name),
            attr(&channel.title),
            attr(group),
            single_line(&channel.title),
        );
        for source in &channel.sources {
            out.push_str(source);
            out.push('\n');
        }
    }
    out
}

pub fn render_guide(channels: &[Channel], blocked: &BTreeSet<String>) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<tv>\n");

    for channel in visible_channels(channels, blocked) {
        if channel.title.is_empty() || channel.epg_name.is_empty() {
            continue;
        }
        let program = channel.program.as_ref().filter(|p| !p.title.is_empty());
        if channel.sources.is_empty() && program.is_none() {
            continue;
        }

        let id = escape(channel.epg_name.as_str());
        let _ = writeln!(out, "  <channel id=\"{id}\">");
        let _ = writeln!(
            out,
            "    <display-name lang=\"{GUIDE_CHANNEL_LANG}\">{}</display-name>",
            escape(channel.title.as_str())
        );
        out.push_str("  </channel>\n");

        if let Some(program) = program {
            let _ = writeln!(
                out,
                "  <programme start=\"{}\" stop=\"{}\" channel=\"{id}\">",
                escape(program.start.as_str()),
                escape(program.stop.as_str()),
            );
            let _ = writeln!(
                out,
                "    <title lang=\"\">{}</title>",
                escape(program.title.as_str())
            );
            if let Some(desc) = &program.description {
                let _ = writeln!(out, "    <desc lang=\"\">{}</desc>", escape(desc.as_str()));
            }
            if let Some(genre) = &channel.genre {
                let _ = writeln!(
                    out,
                    "    <category lang=\"\">{}</category>",
                    escape(genre.as_str())
                );
            }
            out.push_str("  </programme>\n");
        }
    }

    out.push_str("</tv>\n");
    out
}

/// M3U attribute values cannot hold quotes or line breaks.
fn attr(value: &str) -> String {
    single_line(value).replace('"', "'")
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_genres_trims_and_drops_empty() {
        let set = blocked_genres(" Kids, ,Adult ,,News");
        let expected: BTreeSet<String> = ["Kids", "Adult", "News"].iter().map(|s| s.to_string()).collect();
        assert_eq!(set, expected);
        assert!(blocked_genres("").is_empty());
    }

    #[test]
    fn blocked_match_is_case_sensitive() {
        let blocked = blocked_genres("Kids");
        let kids = Channel {
            genre: Some("kids".into()),
            ..Default::default()
        };
        assert!(!is_blocked(&kids, &blocked));
        let no_genre = Channel::default();
        assert!(!is_blocked(&no_genre, &blocked));
    }

    #[test]
    fn attribute_values_are_sanitised() {
        assert_eq!(attr("a \"b\"\nc"), "a 'b' c");
    }
}
