use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tracing::debug;

use super::codec::{encode_sentence, read_sentence};
use super::command::{Command, Record};
use super::{Error, tls};

/// Any byte stream a session can run over (plain TCP, TLS, or an in-memory pipe in tests).
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// The collected reply to one command.
#[derive(Debug, Default)]
pub struct Reply {
    /// One entry per `!re` sentence, in order.
    pub re: Vec<Record>,
    /// Attributes carried by the closing `!done` sentence.
    pub done: Record,
}

/// An authenticated API session. Commands run one at a time.
pub struct Client {
    stream: BufStream<Box<dyn Transport>>,
}

impl Client {
    /// Wraps an already-connected stream. No login is performed.
    pub fn new<T: Transport + 'static>(stream: T) -> Self {
        Self {
            stream: BufStream::new(Box::new(stream)),
        }
    }

    /// Dials `host:port`, optionally wraps the stream in TLS, and logs in.
    /// The whole sequence is bounded by `timeout`.
    pub async fn connect(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        use_tls: bool,
        timeout: Duration,
    ) -> Result<Self, Error> {
        tokio::time::timeout(timeout, async {
            let tcp = TcpStream::connect((host, port)).await?;
            tcp.set_nodelay(true)?;

            let mut client = if use_tls {
                let connector = tls::insecure_connector()?;
                let stream = connector.connect(tls::server_name(host)?, tcp).await?;
                Self::new(stream)
            } else {
                Self::new(tcp)
            };

            client.login(username, password).await?;
            Ok::<Self, Error>(client)
        })
        .await
        .map_err(|_| Error::Timeout(timeout.as_secs()))?
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), Error> {
        let command = Command::new("/login")
            .attr("name", username)
            .attr("password", password);

        let reply = match self.run(&command).await {
            Ok(reply) => reply,
            Err(Error::Trap { message, .. }) => return Err(Error::Login(message)),
            Err(e) => return Err(e),
        };

        if reply.done.get("ret").is_some() {
            return Err(Error::Login(
                "device only supports the legacy challenge login (RouterOS < 6.43)".to_string(),
            ));
        }

        debug!(user = username, "Logged in to device.");
        Ok(())
    }

    /// Sends a command and collects its reply up to `!done`.
    ///
    /// A `!trap` is remembered and returned as an error once the closing `!done` has been
    /// consumed, so the session stays usable for the next command.
    pub async fn run(&mut self, command: &Command) -> Result<Reply, Error> {
        let bytes = encode_sentence(&command.to_words());
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;

        let mut reply = Reply::default();
        let mut trap: Option<Error> = None;

        loop {
            let sentence = read_sentence(&mut self.stream).await?;
            let Some((kind, attributes)) = sentence.split_first() else {
                continue;
            };

            match kind.as_str() {
                "!re" => {
                    reply
                        .re
                        .push(Record::from_attribute_words(attributes.iter().map(String::as_str)));
                }
                "!done" => {
                    reply.done =
                        Record::from_attribute_words(attributes.iter().map(String::as_str));
                    break;
                }
                "!trap" => {
                    let record =
                        Record::from_attribute_words(attributes.iter().map(String::as_str));
                    if trap.is_none() {
                        trap = Some(Error::Trap {
                            category: record.get("category").map(str::to_string),
                            message: record.field("message").to_string(),
                        });
                    }
                }
                "!fatal" => {
                    let reason = attributes.join(" ");
                    return Err(Error::Fatal(reason));
                }
                "!empty" => {}
                other => {
                    return Err(Error::Protocol(format!("unexpected reply word '{other}'")));
                }
            }
        }

        match trap {
            Some(err) => Err(err),
            None => Ok(reply),
        }
    }

    /// Shuts the stream down. Errors are irrelevant at this point and are ignored.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "Error while shutting down device session.");
        }
    }
}
