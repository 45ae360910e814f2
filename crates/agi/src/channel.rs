use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use ivrbook_core::errors::TelephonyError;
use ivrbook_core::telephony::Telephony;

use crate::environment::AgiEnvironment;
use crate::reply::{parse_reply_line, quote, AgiReply, ReplyLine};

/// Telephony over the AGI line protocol: one command line out, one reply
/// line back.
pub struct AgiChannel<R, W> {
    reader: R,
    writer: W,
    environment: AgiEnvironment,
    closed: bool,
}

impl<R, W> AgiChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Reads the `agi_*` header block up to the first blank line.
    pub async fn connect(mut reader: R, writer: W) -> Result<Self, TelephonyError> {
        let mut environment = AgiEnvironment::default();
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader.read_line(&mut line).await?;
            if read == 0 {
                if environment.is_empty() {
                    return Err(TelephonyError::ChannelClosed);
                }
                break;
            }
            if line.trim().is_empty() {
                break;
            }
            environment.push_line(&line);
        }

        debug!(
            event_name = "agi.environment.read",
            variables = environment.len(),
            channel = environment.channel().unwrap_or("unknown"),
            unique_id = environment.unique_id().unwrap_or("unknown"),
            "agi environment received"
        );
        Ok(Self { reader, writer, environment, closed: false })
    }

    pub fn environment(&self) -> &AgiEnvironment {
        &self.environment
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    async fn send(&mut self, command: &str) -> Result<AgiReply, TelephonyError> {
        if self.closed {
            return Err(TelephonyError::ChannelClosed);
        }

        debug!(event_name = "agi.command.sent", command, "sending agi command");
        let mut frame = String::with_capacity(command.len() + 1);
        frame.push_str(command);
        frame.push('\n');
        if let Err(error) = self.write_frame(frame.as_bytes()).await {
            return Err(self.close_on(error));
        }

        match self.read_reply().await {
            Ok(reply) => Ok(reply),
            Err(error) => Err(self.close_on(error)),
        }
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TelephonyError> {
        self.writer.write_all(frame).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> Result<AgiReply, TelephonyError> {
        let mut line = String::new();
        let mut in_usage_block = false;

        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(TelephonyError::ChannelClosed);
            }

            if in_usage_block {
                if line.starts_with("520 ") {
                    return Err(TelephonyError::Protocol(format!(
                        "command rejected: {}",
                        line.trim_end()
                    )));
                }
                continue;
            }

            match parse_reply_line(&line)? {
                ReplyLine::Reply(reply) => return Ok(reply),
                ReplyLine::HangupNotice => {
                    debug!(event_name = "agi.hangup.notice", "hangup notice from pbx");
                }
                ReplyLine::UsageStart => in_usage_block = true,
            }
        }
    }

    fn close_on(&mut self, error: TelephonyError) -> TelephonyError {
        if error == TelephonyError::ChannelClosed {
            self.closed = true;
        }
        error
    }

    /// Sends a command whose `result=-1` means the channel is gone.
    async fn run(&mut self, command: &str) -> Result<AgiReply, TelephonyError> {
        let reply = self.send(command).await?;
        if reply.is_failure() {
            self.closed = true;
            return Err(TelephonyError::ChannelClosed);
        }
        Ok(reply)
    }

    /// Playback commands answer `result=-1` for a missing or unplayable
    /// file too, so a failed playback is logged and the call goes on. A
    /// real hangup surfaces as 511 or end of stream.
    async fn stream(&mut self, command: &str) -> Result<(), TelephonyError> {
        let reply = self.send(command).await?;
        if reply.is_failure() {
            warn!(
                event_name = "agi.playback.failed",
                command,
                result = %reply.result,
                "playback failed, continuing"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl<R, W> Telephony for AgiChannel<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn caller_id(&self) -> &str {
        self.environment.caller_id()
    }

    async fn answer(&mut self) -> Result<(), TelephonyError> {
        self.run("ANSWER").await.map(drop)
    }

    async fn hangup(&mut self) -> Result<(), TelephonyError> {
        if self.closed {
            return Ok(());
        }
        // -1 only means the channel was already down.
        let result = self.send("HANGUP").await.map(drop);
        self.closed = true;
        match result {
            Err(TelephonyError::ChannelClosed) => Ok(()),
            other => other,
        }
    }

    async fn play(&mut self, asset: &str) -> Result<(), TelephonyError> {
        self.stream(&format!("STREAM FILE {asset} \"\"")).await
    }

    async fn say_number(&mut self, value: u32) -> Result<(), TelephonyError> {
        self.stream(&format!("SAY NUMBER {value} \"\"")).await
    }

    async fn pause(&mut self, secs: u64) -> Result<(), TelephonyError> {
        let reply = self.run(&format!("EXEC Wait {secs}")).await?;
        if reply.result_code() == Some(-2) {
            return Err(TelephonyError::Protocol(
                "dialplan application Wait not found".to_owned(),
            ));
        }
        Ok(())
    }

    async fn collect_digits(
        &mut self,
        tone: &str,
        timeout_ms: u64,
        max_digits: u8,
    ) -> Result<String, TelephonyError> {
        let reply = self.send(&format!("GET DATA {tone} {timeout_ms} {max_digits}")).await?;
        // -1 is a failed read; the next command reports a real hangup.
        let digits =
            if reply.is_failure() { String::new() } else { reply.result.trim().to_owned() };
        debug!(
            event_name = "agi.digits.received",
            digits = %digits,
            timed_out = reply.timed_out(),
            "digits received"
        );
        Ok(digits)
    }

    async fn verbose(&mut self, message: &str) -> Result<(), TelephonyError> {
        self.run(&format!("VERBOSE {} 1", quote(message))).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ivrbook_core::errors::TelephonyError;
    use ivrbook_core::telephony::Telephony;

    use crate::channel::AgiChannel;

    type TestChannel = AgiChannel<Cursor<Vec<u8>>, Vec<u8>>;

    const HEADER: &str = "agi_request: reservation.agi\nagi_channel: SIP/trunk-01\n\
                          agi_uniqueid: 1700000000.42\nagi_callerid: 01012345678\n\n";

    async fn open(replies: &str) -> TestChannel {
        let input = format!("{HEADER}{replies}").into_bytes();
        AgiChannel::connect(Cursor::new(input), Vec::new()).await.expect("environment")
    }

    fn written(channel: TestChannel) -> String {
        let (_, writer) = channel.into_inner();
        String::from_utf8(writer).expect("utf8 commands")
    }

    #[tokio::test]
    async fn connect_reads_environment_until_blank_line() {
        let channel = open("200 result=0\n").await;

        assert_eq!(channel.caller_id(), "01012345678");
        assert_eq!(channel.environment().get("agi_request"), Some("reservation.agi"));
        assert_eq!(channel.environment().unique_id(), Some("1700000000.42"));
    }

    #[tokio::test]
    async fn connect_on_empty_stream_is_a_closed_channel() {
        let result = AgiChannel::connect(Cursor::new(Vec::new()), Vec::new()).await;
        assert!(matches!(result, Err(TelephonyError::ChannelClosed)));
    }

    #[tokio::test]
    async fn commands_use_the_agi_wire_format() {
        let mut channel = open(&"200 result=0\n".repeat(6)).await;

        channel.answer().await.expect("answer");
        channel.play("hospital_reservation/welcome").await.expect("play");
        channel.say_number(15).await.expect("say");
        channel.pause(1).await.expect("pause");
        channel.verbose("caller said \"hi\"").await.expect("verbose");
        channel.hangup().await.expect("hangup");

        assert_eq!(
            written(channel),
            "ANSWER\n\
             STREAM FILE hospital_reservation/welcome \"\"\n\
             SAY NUMBER 15 \"\"\n\
             EXEC Wait 1\n\
             VERBOSE \"caller said \\\"hi\\\"\" 1\n\
             HANGUP\n"
        );
    }

    #[tokio::test]
    async fn get_data_returns_digits_or_empty_on_timeout() {
        let mut channel = open("200 result=15\n200 result= (timeout)\n").await;

        assert_eq!(channel.collect_digits("beep", 10_000, 2).await.expect("digits"), "15");
        assert_eq!(channel.collect_digits("beep", 10_000, 2).await.expect("timeout"), "");
        assert_eq!(written(channel), "GET DATA beep 10000 2\nGET DATA beep 10000 2\n");
    }

    #[tokio::test]
    async fn hangup_notice_lines_are_skipped() {
        let mut channel = open("HANGUP\n200 result=5\n").await;
        assert_eq!(channel.collect_digits("beep", 10_000, 2).await.expect("digits"), "5");
    }

    #[tokio::test]
    async fn end_of_stream_closes_the_channel_for_good() {
        let mut channel = open("").await;

        assert_eq!(channel.play("welcome").await, Err(TelephonyError::ChannelClosed));
        assert_eq!(channel.say_number(1).await, Err(TelephonyError::ChannelClosed));
        assert_eq!(channel.hangup().await, Ok(()));
        assert_eq!(written(channel), "STREAM FILE welcome \"\"\n");
    }

    #[tokio::test]
    async fn failed_reads_are_empty_input_and_dead_channel_is_closed() {
        let mut channel = open("200 result=-1\n200 result=-1\n").await;
        assert_eq!(channel.collect_digits("beep", 10_000, 1).await, Ok(String::new()));
        assert_eq!(channel.answer().await, Err(TelephonyError::ChannelClosed));

        let mut channel = open("511 Command Not Permitted on a dead channel\n").await;
        assert_eq!(channel.answer().await, Err(TelephonyError::ChannelClosed));
    }

    #[tokio::test]
    async fn failed_playback_keeps_the_channel_open() {
        let mut channel =
            open("200 result=-1 endpos=0\n200 result=-1\n200 result=0\n200 result=1\n").await;

        assert_eq!(channel.play("hospital_reservation/welcome").await, Ok(()));
        assert_eq!(channel.say_number(15).await, Ok(()));
        assert_eq!(channel.pause(1).await, Ok(()));
        assert_eq!(channel.hangup().await, Ok(()));
        assert_eq!(
            written(channel),
            "STREAM FILE hospital_reservation/welcome \"\"\n\
             SAY NUMBER 15 \"\"\n\
             EXEC Wait 1\n\
             HANGUP\n"
        );
    }

    #[tokio::test]
    async fn usage_block_is_consumed_as_protocol_error() {
        let mut channel = open(
            "520-Invalid command syntax.  Proper usage follows:\n\
             Usage: GET DATA\n\
             520 End of proper usage.\n\
             200 result=0\n",
        )
        .await;

        assert!(matches!(
            channel.collect_digits("beep", 0, 2).await,
            Err(TelephonyError::Protocol(_))
        ));
        channel.answer().await.expect("stream realigned after usage block");
    }
}
