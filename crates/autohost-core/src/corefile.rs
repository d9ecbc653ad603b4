//! Idempotent editing of CoreDNS `Corefile` documents.
//!
//! The document is never turned into a syntax tree. Every operation re-scans the text,
//! finds blocks by counting brace depth from a header's `{`, and rewrites only the lines it
//! has to. Unbalanced braces inside comments are not supported.

use std::net::IpAddr;
use std::ops::Range;

/// Port every managed zone listens on.
pub const DNS_PORT: u16 = 53;

const INDENT: &str = "    ";
const FALLTHROUGH: &str = "fallthrough";
const RESOLV_CONF: &str = "/etc/resolv.conf";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorefileError {
    #[error("zone `{0}` does not exist in the Corefile")]
    ZoneNotFound(String),
    #[error("block `{0}` has no matching closing brace")]
    UnbalancedBlock(String),
    #[error("{0} must not be empty")]
    EmptyArgument(&'static str),
    #[error("{what} `{value}` contains whitespace or braces")]
    InvalidToken { what: &'static str, value: String },
}

/// One `<address> <name>` line of a `hosts` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub address: String,
    pub name: String,
}

/// The text of a Corefile, edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corefile {
    text: String,
}

#[derive(Debug, Clone, Copy)]
struct Block {
    line_start: usize,
    open: usize,
    close: usize,
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    text: &'a str,
    depth: usize,
}

impl Line<'_> {
    fn indent(&self) -> &str {
        leading_whitespace(self.text)
    }

    fn directive(&self) -> Option<&str> {
        self.text.split_whitespace().next()
    }
}

impl Corefile {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// The document written the first time the DNS container is provisioned: no zones, only
    /// the catch-all block forwarding to the host resolver.
    pub fn skeleton() -> Self {
        let mut text = String::from("# CoreDNS configuration managed by autohost\n\n");
        text.push_str(&render_catch_all("\n"));
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Names of every `<zone>:53 { ... }` block, in document order.
    pub fn zones(&self) -> Vec<String> {
        lines(&self.text, 0, self.text.len())
            .into_iter()
            .filter(|line| line.depth == 0)
            .filter_map(|line| {
                let header = line.text.trim().strip_suffix('{')?.trim_end();
                let name = header.strip_suffix(&format!(":{DNS_PORT}"))?;
                (!name.is_empty() && name != "." && !name.contains(char::is_whitespace))
                    .then(|| name.to_string())
            })
            .collect()
    }

    /// Address mappings of the zone's `hosts` block. Empty when the zone has no such block.
    pub fn mappings(&self, zone: &str) -> Result<Vec<Mapping>, CorefileError> {
        let block = self.zone_block(zone)?;
        let Some(hosts) = find_hosts(&self.text, block)? else {
            return Ok(Vec::new());
        };

        Ok(lines(&self.text, hosts.open + 1, hosts.close)
            .into_iter()
            .filter(|line| line.depth == 0)
            .filter_map(|line| {
                let mut tokens = line.text.split_whitespace();
                let address = tokens.next()?;
                let name = tokens.last()?;
                address.parse::<IpAddr>().ok()?;
                Some(Mapping {
                    address: address.to_string(),
                    name: name.to_string(),
                })
            })
            .collect())
    }

    /// Guarantees a `<zone>:53` block bound to `bind` with a `hosts` sub-block.
    ///
    /// A missing zone is inserted right before the catch-all block, or appended together
    /// with a new catch-all block when the document has none. Returns whether the text
    /// changed.
    pub fn ensure_zone(&mut self, zone: &str, bind: &str) -> Result<bool, CorefileError> {
        validate_token("zone", zone)?;
        validate_token("bind address", bind)?;

        let before = self.text.clone();
        if find_zone(&self.text, zone)?.is_none() {
            self.insert_zone(zone, bind);
        } else {
            self.ensure_bind(zone, bind)?;
            self.ensure_hosts_block(zone)?;
        }
        Ok(self.text != before)
    }

    /// Guarantees the zone's `hosts` block maps `name` to `address`.
    ///
    /// A line whose last token is `name` has its address rewritten in place; otherwise a new
    /// line goes right before `fallthrough`. The zone must already exist.
    pub fn ensure_mapping(
        &mut self,
        zone: &str,
        name: &str,
        address: &str,
    ) -> Result<bool, CorefileError> {
        validate_token("zone", zone)?;
        validate_token("host name", name)?;
        validate_token("address", address)?;

        let nl = self.newline();
        let block = self.zone_block(zone)?;

        let Some(hosts) = find_hosts(&self.text, block)? else {
            let indent = body_indent(&self.text, block);
            let snippet = format!(
                "{indent}hosts {{{nl}{indent}{INDENT}{address} {name}{nl}{indent}{INDENT}{FALLTHROUGH}{nl}{indent}}}{nl}"
            );
            insert_before_close(&mut self.text, block, &snippet, nl);
            return Ok(true);
        };

        let body = lines(&self.text, hosts.open + 1, hosts.close);
        let top_level: Vec<Line<'_>> = body.into_iter().filter(|l| l.depth == 0).collect();

        for line in &top_level {
            if let Some(range) = matching_address(line.text, name) {
                if &line.text[range.clone()] == address {
                    return Ok(false);
                }
                let at = line.start + range.start..line.start + range.end;
                self.text.replace_range(at, address);
                return Ok(true);
            }
        }

        let fallthrough = top_level
            .iter()
            .find(|line| line.directive() == Some(FALLTHROUGH))
            .map(|line| (line.start, line.indent().to_string()));

        match fallthrough {
            Some((at, indent)) => {
                self.text
                    .insert_str(at, &format!("{indent}{address} {name}{nl}"));
            }
            None => {
                let indent = top_level
                    .iter()
                    .rev()
                    .find(|l| !l.text.trim().is_empty() && !l.text.trim().starts_with('}'))
                    .map(|l| l.indent().to_string())
                    .unwrap_or_else(|| format!("{}{INDENT}", header_indent(&self.text, hosts)));
                let snippet = format!("{indent}{address} {name}{nl}");
                insert_before_close(&mut self.text, hosts, &snippet, nl);
            }
        }
        Ok(true)
    }

    /// `ensure_zone` followed by `ensure_mapping`, reporting whether either changed the text.
    pub fn ensure_domain(
        &mut self,
        zone: &str,
        fqdn: &str,
        address: &str,
    ) -> Result<bool, CorefileError> {
        let zone_changed = self.ensure_zone(zone, address)?;
        let mapping_changed = self.ensure_mapping(zone, fqdn, address)?;
        Ok(zone_changed || mapping_changed)
    }

    fn newline(&self) -> &'static str {
        if self.text.contains("\r\n") { "\r\n" } else { "\n" }
    }

    fn zone_block(&self, zone: &str) -> Result<Block, CorefileError> {
        find_zone(&self.text, zone)?.ok_or_else(|| CorefileError::ZoneNotFound(zone.to_string()))
    }

    fn insert_zone(&mut self, zone: &str, bind: &str) {
        let nl = self.newline();
        let block = render_zone(zone, bind, nl);

        if let Some(at) = find_catch_all(&self.text) {
            self.text.insert_str(at, &format!("{block}{nl}"));
            return;
        }

        if !self.text.is_empty() {
            if !self.text.ends_with('\n') {
                self.text.push_str(nl);
            }
            if !ends_with_blank_line(&self.text) {
                self.text.push_str(nl);
            }
        }
        self.text.push_str(&block);
        self.text.push_str(nl);
        self.text.push_str(&render_catch_all(nl));
    }

    fn ensure_bind(&mut self, zone: &str, bind: &str) -> Result<(), CorefileError> {
        let block = self.zone_block(zone)?;
        let body = lines(&self.text, block.open + 1, block.close);
        let binds: Vec<&Line<'_>> = body
            .iter()
            .filter(|l| l.depth == 0 && l.directive() == Some("bind"))
            .collect();

        if binds
            .iter()
            .any(|l| l.text.split_whitespace().skip(1).any(|a| a == bind))
        {
            return Ok(());
        }

        if let Some(line) = binds.first() {
            let replacement = format!("{}bind {bind}", line.indent());
            let range = line.start..line.start + line.text.len();
            self.text.replace_range(range, &replacement);
            return Ok(());
        }

        let nl = self.newline();
        let indent = body_indent(&self.text, block);
        insert_first_line(&mut self.text, block, &format!("{indent}bind {bind}"), nl);
        Ok(())
    }

    fn ensure_hosts_block(&mut self, zone: &str) -> Result<(), CorefileError> {
        let block = self.zone_block(zone)?;
        if find_hosts(&self.text, block)?.is_some() {
            return Ok(());
        }

        let nl = self.newline();
        let indent = body_indent(&self.text, block);
        let snippet = format!(
            "{indent}hosts {{{nl}{indent}{INDENT}{FALLTHROUGH}{nl}{indent}}}{nl}"
        );
        insert_before_close(&mut self.text, block, &snippet, nl);
        Ok(())
    }
}

impl std::fmt::Display for Corefile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

fn validate_token(what: &'static str, value: &str) -> Result<(), CorefileError> {
    if value.trim().is_empty() {
        return Err(CorefileError::EmptyArgument(what));
    }
    if value.contains(|c: char| c.is_whitespace() || c == '{' || c == '}') {
        return Err(CorefileError::InvalidToken {
            what,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn render_zone(zone: &str, bind: &str, nl: &str) -> String {
    [
        format!("{zone}:{DNS_PORT} {{"),
        format!("{INDENT}bind {bind}"),
        format!("{INDENT}log"),
        format!("{INDENT}errors"),
        format!("{INDENT}hosts {{"),
        format!("{INDENT}{INDENT}{FALLTHROUGH}"),
        format!("{INDENT}}}"),
        "}".to_string(),
    ]
    .iter()
    .fold(String::new(), |mut out, line| {
        out.push_str(line);
        out.push_str(nl);
        out
    })
}

fn render_catch_all(nl: &str) -> String {
    [
        ". {".to_string(),
        format!("{INDENT}log"),
        format!("{INDENT}errors"),
        format!("{INDENT}forward . {RESOLV_CONF}"),
        "}".to_string(),
    ]
    .iter()
    .fold(String::new(), |mut out, line| {
        out.push_str(line);
        out.push_str(nl);
        out
    })
}

/// Splits `doc[from..to]` into lines, recording the brace depth (relative to `from`) at the
/// start of each one. Line texts exclude the terminator.
fn lines(doc: &str, from: usize, to: usize) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = from;

    for piece in doc[from..to].split('\n') {
        let text = piece.strip_suffix('\r').unwrap_or(piece);
        out.push(Line { start, text, depth });
        for c in piece.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        start += piece.len() + 1;
    }
    out
}

/// Offset of the `}` that closes the `{` at `open`.
fn matching_brace(doc: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in doc[open..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn find_zone(doc: &str, zone: &str) -> Result<Option<Block>, CorefileError> {
    let header = format!("{zone}:{DNS_PORT} {{");

    for line in lines(doc, 0, doc.len()) {
        let trimmed = line.text.trim_start();
        if !trimmed.starts_with(&header) {
            continue;
        }
        let open = line.start + (line.text.len() - trimmed.len()) + header.len() - 1;
        let close = matching_brace(doc, open)
            .ok_or_else(|| CorefileError::UnbalancedBlock(format!("{zone}:{DNS_PORT}")))?;
        return Ok(Some(Block {
            line_start: line.start,
            open,
            close,
        }));
    }
    Ok(None)
}

fn find_hosts(doc: &str, zone: Block) -> Result<Option<Block>, CorefileError> {
    for line in lines(doc, zone.open + 1, zone.close) {
        if line.depth != 0 || line.directive().is_none_or(|d| !is_hosts_directive(d)) {
            continue;
        }
        let Some(brace) = line.text.find('{') else {
            continue;
        };
        let open = line.start + brace;
        let close = matching_brace(doc, open)
            .ok_or_else(|| CorefileError::UnbalancedBlock("hosts".to_string()))?;
        return Ok(Some(Block {
            line_start: line.start,
            open,
            close,
        }));
    }
    Ok(None)
}

fn is_hosts_directive(token: &str) -> bool {
    token == "hosts" || token.strip_prefix("hosts").is_some_and(|rest| rest.starts_with('{'))
}

/// Start offset of the last top-level `. {` (or `.:<port> {`) header line.
fn find_catch_all(doc: &str) -> Option<usize> {
    lines(doc, 0, doc.len())
        .into_iter()
        .filter(|line| line.depth == 0 && is_catch_all_header(line.text))
        .map(|line| line.start)
        .last()
}

fn is_catch_all_header(text: &str) -> bool {
    let Some(rest) = text.trim_start().strip_prefix('.') else {
        return false;
    };
    let rest = match rest.strip_prefix(':') {
        Some(port) => port.trim_start_matches(|c: char| c.is_ascii_digit()),
        None => rest,
    };
    rest.trim_start().starts_with('{')
}

/// Byte range of the address token when the line's last token is exactly `name`.
fn matching_address(text: &str, name: &str) -> Option<Range<usize>> {
    let trimmed = text.trim();
    if trimmed.starts_with('#') {
        return None;
    }
    let mut tokens = trimmed.split_whitespace();
    let first = tokens.next()?;
    if tokens.last()? != name {
        return None;
    }
    let start = text.len() - text.trim_start().len();
    Some(start..start + first.len())
}

fn leading_whitespace(text: &str) -> &str {
    &text[..text.len() - text.trim_start_matches([' ', '\t']).len()]
}

fn header_indent(doc: &str, block: Block) -> &str {
    let line_end = doc[block.line_start..]
        .find('\n')
        .map_or(doc.len(), |i| block.line_start + i);
    leading_whitespace(&doc[block.line_start..line_end])
}

/// Indentation of the block's first directive, or the header's plus one level.
fn body_indent(doc: &str, block: Block) -> String {
    lines(doc, block.open + 1, block.close)
        .into_iter()
        .find(|l| l.depth == 0 && !l.text.trim().is_empty() && !l.text.trim().starts_with('}'))
        .map(|l| l.indent().to_string())
        .unwrap_or_else(|| format!("{}{INDENT}", header_indent(doc, block)))
}

fn insert_first_line(doc: &mut String, block: Block, line: &str, nl: &str) {
    match doc[block.open + 1..block.close].find('\n') {
        Some(rel) => {
            let at = block.open + 1 + rel + 1;
            doc.insert_str(at, &format!("{line}{nl}"));
        }
        None => {
            let outer = header_indent(doc, block).to_string();
            doc.insert_str(block.open + 1, &format!("{nl}{line}{nl}{outer}"));
        }
    }
}

/// Inserts `snippet` (whole lines, terminated) just before the block's closing brace line.
fn insert_before_close(doc: &mut String, block: Block, snippet: &str, nl: &str) {
    let close_line = doc[..block.close].rfind('\n').map_or(0, |i| i + 1);
    let close_line = close_line.max(block.open + 1);
    if doc[close_line..block.close].trim().is_empty() && close_line > block.open + 1 {
        doc.insert_str(close_line, snippet);
    } else {
        doc.insert_str(block.close, &format!("{nl}{snippet}"));
    }
}

fn ends_with_blank_line(text: &str) -> bool {
    let Some(rest) = text.strip_suffix('\n') else {
        return false;
    };
    let rest = rest.strip_suffix('\r').unwrap_or(rest);
    rest.is_empty() || rest.ends_with('\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EXPECTED_NEW: &str = "maza-server:53 {
    bind 100.64.0.5
    log
    errors
    hosts {
        fallthrough
    }
}

. {
    log
    errors
    forward . /etc/resolv.conf
}
";

    #[test]
    fn empty_document_gets_zone_and_catch_all() {
        let mut doc = Corefile::default();
        assert!(doc.ensure_zone("maza-server", "100.64.0.5").unwrap());
        assert_eq!(doc.as_str(), EXPECTED_NEW);
        assert_eq!(doc.zones(), vec!["maza-server".to_string()]);
        assert_eq!(doc.as_str().matches(". {").count(), 1);
    }

    #[test]
    fn mapping_goes_before_fallthrough_and_repeats_are_noops() {
        let mut doc = Corefile::default();
        doc.ensure_zone("maza-server", "100.64.0.5").unwrap();
        assert!(
            doc.ensure_mapping("maza-server", "app.maza-server", "100.64.0.5")
                .unwrap()
        );
        assert!(doc.as_str().contains(
            "    hosts {\n        100.64.0.5 app.maza-server\n        fallthrough\n    }\n"
        ));

        let snapshot = doc.clone();
        assert!(!doc.ensure_zone("maza-server", "100.64.0.5").unwrap());
        assert!(
            !doc.ensure_mapping("maza-server", "app.maza-server", "100.64.0.5")
                .unwrap()
        );
        assert_eq!(doc, snapshot);
    }

    #[test]
    fn mapping_overwrite_touches_only_the_address() {
        let input = "zone:53 {\n    bind 10.0.0.9\n    hosts {\n        10.0.0.1   app.zone\n        10.0.0.3 db.zone\n        fallthrough\n    }\n}\n";
        let mut doc = Corefile::new(input);
        assert!(doc.ensure_mapping("zone", "app.zone", "10.0.0.2").unwrap());
        assert_eq!(
            doc.as_str(),
            input.replace("10.0.0.1   app.zone", "10.0.0.2   app.zone")
        );
        assert_eq!(
            doc.mappings("zone").unwrap(),
            vec![
                Mapping {
                    address: "10.0.0.2".into(),
                    name: "app.zone".into()
                },
                Mapping {
                    address: "10.0.0.3".into(),
                    name: "db.zone".into()
                },
            ]
        );
    }

    #[test]
    fn new_zone_lands_before_existing_catch_all() {
        let mut doc = Corefile::skeleton();
        doc.ensure_zone("lab", "100.64.0.7").unwrap();

        let text = doc.as_str();
        let zone_at = text.find("lab:53 {").unwrap();
        let dot_at = text.find("\n. {").unwrap();
        assert!(zone_at < dot_at);
        assert!(text.starts_with("# CoreDNS configuration managed by autohost\n\nlab:53 {"));
        assert!(text.contains("}\n\n. {\n"));
        assert_eq!(text.matches(". {").count(), 1);
    }

    #[test]
    fn unrelated_zone_is_preserved_byte_for_byte() {
        let zone_a = "a:53 {\n\tbind 10.1.1.1\n\t# keep me\n\thosts {\n\t\t10.1.1.2 x.a\n\t\tfallthrough\n\t}\n}\n";
        let mut doc = Corefile::new(format!("{zone_a}\n. {{\n    forward . 1.1.1.1\n}}\n"));

        assert!(doc.ensure_domain("b", "y.b", "10.2.2.2").unwrap());
        assert!(doc.as_str().starts_with(zone_a));
        assert_eq!(doc.mappings("a").unwrap().len(), 1);
        assert_eq!(
            doc.mappings("b").unwrap(),
            vec![Mapping {
                address: "10.2.2.2".into(),
                name: "y.b".into()
            }]
        );
    }

    #[test]
    fn existing_bind_is_rewritten_with_its_indentation() {
        let mut doc = Corefile::new("z:53 {\n  bind 100.64.0.1\n  hosts {\n    fallthrough\n  }\n}\n");
        assert!(doc.ensure_zone("z", "100.64.0.2").unwrap());
        assert_eq!(
            doc.as_str(),
            "z:53 {\n  bind 100.64.0.2\n  hosts {\n    fallthrough\n  }\n}\n"
        );
    }

    #[test]
    fn missing_bind_becomes_first_line_and_hosts_block_is_added() {
        let mut doc = Corefile::new("z:53 {\n    log\n}\n");
        assert!(doc.ensure_zone("z", "100.64.0.2").unwrap());
        assert_eq!(
            doc.as_str(),
            "z:53 {\n    bind 100.64.0.2\n    log\n    hosts {\n        fallthrough\n    }\n}\n"
        );
    }

    #[test]
    fn mapping_without_fallthrough_is_appended_with_sibling_indent() {
        let mut doc = Corefile::new("z:53 {\n    hosts {\n      10.0.0.1 a.z\n    }\n}\n");
        assert!(doc.ensure_mapping("z", "b.z", "10.0.0.2").unwrap());
        assert_eq!(
            doc.as_str(),
            "z:53 {\n    hosts {\n      10.0.0.1 a.z\n      10.0.0.2 b.z\n    }\n}\n"
        );
    }

    #[test]
    fn mapping_creates_hosts_block_when_zone_has_none() {
        let mut doc = Corefile::new("z:53 {\n    bind 10.0.0.1\n}\n");
        assert!(doc.ensure_mapping("z", "a.z", "10.0.0.1").unwrap());
        assert_eq!(
            doc.as_str(),
            "z:53 {\n    bind 10.0.0.1\n    hosts {\n        10.0.0.1 a.z\n        fallthrough\n    }\n}\n"
        );
    }

    #[test]
    fn trailing_token_match_is_exact() {
        let mut doc = Corefile::new(
            "z:53 {\n    hosts {\n        10.0.0.1 sub-zone\n        fallthrough\n    }\n}\n",
        );
        assert!(doc.ensure_mapping("z", "zone", "10.0.0.2").unwrap());
        assert!(doc.as_str().contains("10.0.0.1 sub-zone\n"));
        assert!(doc.as_str().contains("10.0.0.2 zone\n        fallthrough"));
    }

    #[test]
    fn zone_header_must_start_the_line() {
        let mut doc = Corefile::new("maza-server:53 {\n    bind 10.0.0.1\n}\n");
        assert_eq!(
            doc.ensure_mapping("server", "a.server", "10.0.0.1"),
            Err(CorefileError::ZoneNotFound("server".into()))
        );
    }

    #[test]
    fn crlf_documents_keep_crlf() {
        let mut doc = Corefile::new("z:53 {\r\n    hosts {\r\n        fallthrough\r\n    }\r\n}\r\n");
        doc.ensure_mapping("z", "a.z", "10.0.0.1").unwrap();
        assert_eq!(
            doc.as_str(),
            "z:53 {\r\n    hosts {\r\n        10.0.0.1 a.z\r\n        fallthrough\r\n    }\r\n}\r\n"
        );
    }

    #[test]
    fn unbalanced_zone_is_an_error() {
        let mut doc = Corefile::new("z:53 {\n    bind 10.0.0.1\n");
        assert_eq!(
            doc.ensure_zone("z", "10.0.0.1"),
            Err(CorefileError::UnbalancedBlock("z:53".into()))
        );
        assert_eq!(doc.as_str(), "z:53 {\n    bind 10.0.0.1\n");
    }

    #[test]
    fn rejects_empty_and_spaced_arguments() {
        let mut doc = Corefile::default();
        assert_eq!(
            doc.ensure_zone("", "10.0.0.1"),
            Err(CorefileError::EmptyArgument("zone"))
        );
        assert!(matches!(
            doc.ensure_zone("a b", "10.0.0.1"),
            Err(CorefileError::InvalidToken { .. })
        ));
        assert!(doc.as_str().is_empty());
    }

    fn zone_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,8}"
    }

    fn address() -> impl Strategy<Value = String> {
        (1u8..=254, 0u8..=255, 1u8..=254).prop_map(|(a, b, c)| format!("100.{a}.{b}.{c}"))
    }

    proptest! {
        #[test]
        fn ensure_domain_is_idempotent(
            zone in zone_name(),
            leaf in "[a-z]{1,6}",
            addr in address(),
        ) {
            let fqdn = format!("{leaf}.{zone}");
            let mut doc = Corefile::skeleton();
            prop_assert!(doc.ensure_domain(&zone, &fqdn, &addr).unwrap());
            let first = doc.clone();
            prop_assert!(!doc.ensure_domain(&zone, &fqdn, &addr).unwrap());
            prop_assert_eq!(doc, first);
        }

        #[test]
        fn patching_one_zone_preserves_another(
            a in zone_name(),
            b in zone_name(),
            addr_a in address(),
            addr_b in address(),
        ) {
            prop_assume!(a != b);
            let mut doc = Corefile::default();
            doc.ensure_domain(&a, &format!("www.{a}"), &addr_a).unwrap();
            let before = doc.as_str().to_string();
            let zone_a_end = before.find("\n}\n").unwrap() + 3;
            let zone_a = &before[..zone_a_end];

            doc.ensure_domain(&b, &format!("www.{b}"), &addr_b).unwrap();
            prop_assert!(doc.as_str().starts_with(zone_a));
            prop_assert_eq!(doc.zones(), vec![a.clone(), b.clone()]);
        }
    }
}
