use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::codec::FrameCodec;
use crate::frame::Frame;
use crate::Error;

/// A client socket framed with [`FrameCodec`]: requests in, replies out.
pub struct Connection {
    framed: Framed<TcpStream, FrameCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Connection {
        Connection {
            framed: Framed::new(stream, FrameCodec),
        }
    }

    /// Reads the next request. `Ok(None)` means the peer closed the socket.
    ///
    /// Cancel safe: partially received data stays buffered for the next call.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, Error> {
        self.framed.next().await.transpose()
    }

    pub async fn write_frame(&mut self, frame: Frame) -> Result<(), Error> {
        self.framed.send(frame).await
    }
}
