use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::time::{Duration, timeout};

use super::ClientStream;

const READ_CHUNK: usize = 4096;

pub(crate) enum ReadOutcome {
    Read(usize),
    Timeout,
}

/// One read from the socket into `buf`, bounded by `timeout_dur`.
pub(crate) async fn read_more<S>(
    stream: &mut S,
    buf: &mut BytesMut,
    timeout_dur: Duration,
) -> anyhow::Result<ReadOutcome>
where
    S: ClientStream + ?Sized,
{
    let mut tmp = [0u8; READ_CHUNK];
    match timeout(timeout_dur, stream.read(&mut tmp)).await {
        Ok(res) => {
            let n = res?;
            if n > 0 {
                buf.extend_from_slice(&tmp[..n]);
            }
            Ok(ReadOutcome::Read(n))
        }
        Err(_) => Ok(ReadOutcome::Timeout),
    }
}
