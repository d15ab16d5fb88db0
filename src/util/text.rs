use std::borrow::Cow;

/// Returns true for characters that may not appear in an XML 1.0 document.
///
/// Tab, newline and carriage return are the only C0 controls XML allows.
/// DEL is technically legal but is stripped as well since no feed reader
/// renders it meaningfully.
fn is_forbidden(c: char) -> bool {
    matches!(
        c,
        '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{7f}' | '\u{fffe}' | '\u{ffff}'
    )
}

/// Strip characters that would make a serialized feed invalid XML.
///
/// Issue titles and bodies are user-controlled and regularly contain pasted
/// terminal output, so ANSI escape sequences are removed as a whole rather
/// than leaving `[31m` residue behind:
/// - CSI sequences: `\x1b[` ... (final char 0x40-0x7E)
/// - OSC sequences: `\x1b]` ... (until BEL or ST `\x1b\\`)
/// - Bare ESC
///
/// Returns `Cow::Borrowed` when the input is already clean (common case).
pub fn strip_invalid_xml_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_forbidden) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\u{40}'..='\u{7e}').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\u{7}' {
                            break;
                        }
                        if c == '\u{1b}' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            }
        } else if !is_forbidden(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}
