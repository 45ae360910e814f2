use ivrbook_core::errors::TelephonyError;

/// A parsed `200 result=<value> [(<data>)]` response line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgiReply {
    pub code: u16,
    pub result: String,
    pub data: Option<String>,
}

impl AgiReply {
    pub fn result_code(&self) -> Option<i64> {
        self.result.parse().ok()
    }

    /// `result=-1`: the channel failed or the caller is gone.
    pub fn is_failure(&self) -> bool {
        self.result_code() == Some(-1)
    }

    pub fn timed_out(&self) -> bool {
        self.data.as_deref() == Some("timeout")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyLine {
    Reply(AgiReply),
    /// Asynchronous hangup notice interleaved with command replies.
    HangupNotice,
    /// First line of a multi-line `520-` usage block.
    UsageStart,
}

pub fn parse_reply_line(line: &str) -> Result<ReplyLine, TelephonyError> {
    let line = line.trim_end_matches(['\r', '\n']);

    if line == "HANGUP" {
        return Ok(ReplyLine::HangupNotice);
    }
    if line.starts_with("520-") {
        return Ok(ReplyLine::UsageStart);
    }

    let (code, rest) = line.split_once(' ').unwrap_or((line, ""));
    let code: u16 = code
        .parse()
        .map_err(|_| TelephonyError::Protocol(format!("malformed reply line `{line}`")))?;

    match code {
        200 => parse_success(rest).map(ReplyLine::Reply),
        511 => Err(TelephonyError::ChannelClosed),
        510 | 520 => Err(TelephonyError::Protocol(format!("command rejected: {line}"))),
        other => Err(TelephonyError::Protocol(format!("unexpected reply code {other}: {line}"))),
    }
}

fn parse_success(rest: &str) -> Result<AgiReply, TelephonyError> {
    let body = rest
        .trim_start()
        .strip_prefix("result=")
        .ok_or_else(|| TelephonyError::Protocol(format!("reply is missing result: `{rest}`")))?;

    let (result, tail) = match body.find(' ') {
        Some(index) => (&body[..index], body[index + 1..].trim()),
        None => (body, ""),
    };
    let data = tail
        .strip_prefix('(')
        .and_then(|inner| inner.split_once(')'))
        .map(|(inner, _)| inner.to_owned());

    Ok(AgiReply { code: 200, result: result.to_owned(), data })
}

/// Wraps a string argument in double quotes, escaping what AGI's tokenizer
/// would otherwise split on.
pub fn quote(argument: &str) -> String {
    let mut quoted = String::with_capacity(argument.len() + 2);
    quoted.push('"');
    for ch in argument.chars() {
        match ch {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(ch);
            }
            '\r' | '\n' => quoted.push(' '),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use ivrbook_core::errors::TelephonyError;

    use crate::reply::{parse_reply_line, quote, AgiReply, ReplyLine};

    fn reply(line: &str) -> AgiReply {
        match parse_reply_line(line) {
            Ok(ReplyLine::Reply(reply)) => reply,
            other => panic!("expected reply, got {other:?}"),
        }
    }

    #[test]
    fn parses_plain_and_annotated_results() {
        assert_eq!(
            reply("200 result=0\n"),
            AgiReply { code: 200, result: "0".to_owned(), data: None }
        );

        let digits = reply("200 result=15");
        assert_eq!(digits.result, "15");

        let timeout = reply("200 result= (timeout)");
        assert_eq!(timeout.result, "");
        assert!(timeout.timed_out());

        let stream = reply("200 result=0 endpos=12345");
        assert_eq!(stream.result_code(), Some(0));
        assert_eq!(stream.data, None);
    }

    #[test]
    fn minus_one_is_a_failure() {
        assert!(reply("200 result=-1").is_failure());
        assert!(!reply("200 result=1").is_failure());
    }

    #[test]
    fn error_codes_map_to_telephony_errors() {
        assert_eq!(
            parse_reply_line("511 Command Not Permitted on a dead channel"),
            Err(TelephonyError::ChannelClosed)
        );
        assert!(matches!(
            parse_reply_line("510 Invalid or unknown command"),
            Err(TelephonyError::Protocol(message)) if message.contains("510")
        ));
        assert!(matches!(parse_reply_line("garbage"), Err(TelephonyError::Protocol(_))));
        assert!(matches!(parse_reply_line("200 nothing"), Err(TelephonyError::Protocol(_))));
    }

    #[test]
    fn recognizes_hangup_notice_and_usage_block() {
        assert_eq!(parse_reply_line("HANGUP\n"), Ok(ReplyLine::HangupNotice));
        assert_eq!(parse_reply_line("520-Invalid command syntax."), Ok(ReplyLine::UsageStart));
    }

    #[test]
    fn quoting_escapes_delimiters() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\"\n"), "\"say \\\"hi\\\" \"");
        assert_eq!(quote(""), "\"\"");
    }
}
