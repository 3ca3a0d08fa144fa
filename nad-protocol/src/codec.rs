//! Codec for rendering commands and parsing amplifier replies.
//!
//! Frame format:
//! ```text
//! +----------+----------+---------+------+
//! | Variable | Operator | Value   | CR   |
//! | ASCII    | = + - ?  | ASCII   | 0x0D |
//! +----------+----------+---------+------+
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::types::{Command, Operator, Reply};

/// Frame terminator byte.
pub const CR: u8 = b'\r';

/// Render a command into its wire frame.
///
/// Defined only for valid commands; the amplifier client validates before
/// rendering, so an invalid command here is a programming error.
pub fn render(cmd: &Command) -> Bytes {
    debug_assert!(cmd.valid(), "render called with invalid command: {cmd}");
    let mut frame = BytesMut::with_capacity(cmd.variable.len() + cmd.value.len() + 2);
    frame.put_slice(cmd.variable.as_bytes());
    frame.put_u8(cmd.operator.as_char() as u8);
    frame.put_slice(cmd.value.as_bytes());
    frame.put_u8(CR);
    frame.freeze()
}

/// Parse a raw reply frame into a [`Reply`].
///
/// Strips one trailing CR, then splits on the first operator character. The
/// amplifier echoes the variable and operator it executed, followed by the
/// resulting value. Volume step replies carry the resulting level in the
/// operator position; that text lands in [`Reply::volume`].
pub fn parse_reply(raw: &[u8]) -> Result<Reply, ProtocolError> {
    let raw = match raw.strip_suffix(&[CR]) {
        Some(stripped) => stripped,
        None => raw,
    };
    let text = String::from_utf8_lossy(raw);

    let op_index = text
        .char_indices()
        .find(|&(_, c)| Operator::is_operator_char(c))
        .map(|(i, _)| i)
        .ok_or_else(|| ProtocolError::UnparseableReply(text.to_string()))?;
    if op_index == 0 {
        // Operator with no variable in front of it.
        return Err(ProtocolError::UnparseableReply(text.to_string()));
    }

    let variable = text[..op_index].to_string();
    let rest = &text[op_index..];
    let operator_char = rest.chars().next().unwrap_or('?');
    let operator = Operator::from_char(operator_char)
        .map_err(|_| ProtocolError::UnparseableReply(text.to_string()))?;
    let value = rest[operator_char.len_utf8()..].to_string();

    let volume = if variable.eq_ignore_ascii_case("volume") {
        Some(rest.to_string())
    } else {
        None
    };

    Ok(Reply {
        variable,
        operator,
        value,
        volume,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_set() {
        let frame = render(&Command::set("Mute", "Off"));
        assert_eq!(&frame[..], b"Mute=Off\r");
    }

    #[test]
    fn test_render_query() {
        let frame = render(&Command::query("Model"));
        assert_eq!(&frame[..], b"Model?\r");
    }

    #[test]
    fn test_render_step() {
        assert_eq!(&render(&Command::step("Volume", true))[..], b"Volume+\r");
        assert_eq!(&render(&Command::step("Volume", false))[..], b"Volume-\r");
    }

    #[test]
    fn test_parse_reply() {
        let reply = parse_reply(b"Power=On\r").unwrap();
        assert_eq!(reply.variable, "Power");
        assert_eq!(reply.operator, Operator::Equals);
        assert_eq!(reply.value, "On");
        assert_eq!(reply.volume, None);
    }

    #[test]
    fn test_parse_reply_without_terminator() {
        // Callers strip the CR before handing bytes over in some paths.
        let reply = parse_reply(b"Source=CD").unwrap();
        assert_eq!(reply.variable, "Source");
        assert_eq!(reply.value, "CD");
    }

    #[test]
    fn test_render_parse_round_trip() {
        let cmd = Command::set("Source", "Tuner");
        let reply = parse_reply(&render(&cmd)).unwrap();
        assert_eq!(reply.variable, cmd.variable);
        assert_eq!(reply.operator, cmd.operator);
        assert_eq!(reply.value, cmd.value);
    }

    #[test]
    fn test_parse_volume_reply_carries_level() {
        let reply = parse_reply(b"Volume-20\r").unwrap();
        assert_eq!(reply.variable, "Volume");
        assert_eq!(reply.operator, Operator::Decrement);
        assert_eq!(reply.volume.as_deref(), Some("-20"));
    }

    #[test]
    fn test_parse_reply_no_operator() {
        assert_eq!(
            parse_reply(b"garbage\r"),
            Err(ProtocolError::UnparseableReply("garbage".to_string()))
        );
    }

    #[test]
    fn test_parse_reply_leading_operator() {
        assert!(parse_reply(b"=On\r").is_err());
    }

    #[test]
    fn test_parse_empty_reply() {
        assert!(parse_reply(b"\r").is_err());
        assert!(parse_reply(b"").is_err());
    }
}
