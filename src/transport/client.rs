//! Client side of a Network MIDI 2.0 session.

use std::collections::VecDeque;
use std::net::SocketAddr;

use bytes::Bytes;
use tracing::{debug, info, instrument, trace, warn};

use super::auth;
use super::command::{ByeReason, CommandCode, CommandPacket, MAGIC, MidiUdpPacket};
use super::config::{ClientConfig, RECV_BUFFER_SIZE};
use super::error::TransportError;
use super::metrics::Metrics;
use super::session::{Identity, Session, SessionState};
use super::socket::{SocketBinding, resolve};
use super::ump_transport::UmpTransport;
use crate::ump::Ump;

/// Blocking UDP client session with one host.
///
/// Owns its socket; every call blocks the calling thread. Inbound control
/// traffic (pings, BYE) is answered transparently while receiving.
#[derive(Debug)]
pub struct UdpClient {
    config: ClientConfig,
    peer: SocketAddr,
    socket: Option<SocketBinding>,
    session: Session,
    rx_queue: VecDeque<Ump>,
    recv_buf: Vec<u8>,
}

impl UdpClient {
    /// Create a client for the host at `peer`. No socket is opened yet.
    #[must_use]
    pub fn new(peer: SocketAddr, config: ClientConfig) -> Self {
        Self {
            config,
            peer,
            socket: None,
            session: Session::new(),
            rx_queue: VecDeque::new(),
            recv_buf: vec![0u8; RECV_BUFFER_SIZE],
        }
    }

    /// Resolve `host` and create a client for it
    pub fn resolve(host: &str, port: u16, config: ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::new(resolve(host, port)?, config))
    }

    /// Host address
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Session state and remote identity
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Client configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Local socket address, once a socket is open
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        let socket = self.socket.as_ref().ok_or(TransportError::NotConnected)?;
        Ok(socket.local_addr()?)
    }

    /// Open a session: invite the host and answer any authentication
    /// challenge until the invitation is accepted.
    #[instrument(level = "info", skip(self), fields(peer = %self.peer))]
    pub fn connect(&mut self) -> Result<(), TransportError> {
        if self.session.is_established() {
            warn!("already connected");
            return Err(TransportError::AlreadyConnected);
        }
        let invitation = Identity::new(&*self.config.name, &*self.config.product_instance_id)
            .to_command(CommandCode::Invitation, self.config.capabilities())?;
        let socket = self.open_socket()?;

        self.session.reset();
        self.rx_queue.clear();
        if let Err(err) = self.send_commands(&socket, vec![invitation]) {
            return Err(self.abort_connect(err));
        }
        self.session.set_state(SessionState::PendingInvitation);

        loop {
            let commands = match self.recv_commands(&socket) {
                Ok(commands) => commands,
                Err(TransportError::Framing(err)) => {
                    warn!(%err, "dropping malformed datagram");
                    continue;
                }
                Err(err) => return Err(self.abort_connect(err)),
            };
            for command in commands {
                match command.command() {
                    CommandCode::InvitationReplyAccepted => {
                        let remote = Identity::from_command(&command)
                            .inspect_err(|err| warn!(%err, "unreadable host identity"))
                            .ok();
                        info!(remote = ?remote, "invitation accepted");
                        self.session.establish(remote);
                        Metrics::record_session_open();
                        return Ok(());
                    }
                    CommandCode::InvitationReplyAuthRequired
                    | CommandCode::InvitationReplyUserAuthRequired => {
                        self.session.set_state(SessionState::AuthenticationRequired);
                        let reply = match auth::answer_challenge(
                            &command,
                            self.config.credentials.as_ref(),
                        ) {
                            Ok(reply) => reply,
                            Err(err) => {
                                warn!(%err, "cannot answer authentication challenge");
                                return Err(self.abort_connect(err));
                            }
                        };
                        if let Err(err) = self.send_commands(&socket, vec![reply]) {
                            return Err(self.abort_connect(err));
                        }
                    }
                    other => debug!(command = %other, "ignored while connecting"),
                }
            }
        }
    }

    /// Close the session with BYE and release the socket.
    ///
    /// The reason is "user terminated" for an established session and
    /// "invitation canceled" otherwise. Calling this without an open socket
    /// returns [`TransportError::NotConnected`].
    #[instrument(level = "info", skip(self), fields(peer = %self.peer))]
    pub fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(socket) = self.socket.take() else {
            warn!("disconnect without an open session");
            return Err(TransportError::NotConnected);
        };
        let established = self.session.is_established();
        let reason = if established {
            ByeReason::UserTerminated
        } else {
            ByeReason::InvitationCanceled
        };
        let result = self.send_commands(&socket, vec![CommandPacket::bye(reason)]);
        if established {
            Metrics::record_session_close();
        }
        self.session.set_state(SessionState::Closed);
        self.rx_queue.clear();
        info!(?reason, "disconnected");
        result
    }

    /// Probe the host with PING and wait for the matching PING_REPLY.
    ///
    /// Works with or without an established session. UMP data received
    /// meanwhile is queued for [`recv`](Self::recv).
    #[instrument(level = "debug", skip(self), fields(peer = %self.peer))]
    pub fn ping(&mut self) -> Result<(), TransportError> {
        let socket = self.open_socket()?;
        let id = uuid::Uuid::new_v4();
        let token = Bytes::copy_from_slice(&id.as_bytes()[..4]);
        let ping = CommandPacket::new(CommandCode::Ping, 0, token.clone())?;
        self.send_commands(&socket, vec![ping])?;
        loop {
            let commands = self.recv_commands(&socket)?;
            let pongs = self.handle_commands(&socket, commands)?;
            if pongs.contains(&token) {
                debug!("ping answered");
                return Ok(());
            }
        }
    }

    /// Send messages as UMP_DATA commands, several per datagram.
    pub fn send_many(&mut self, messages: &[Ump]) -> Result<(), TransportError> {
        let socket = self.established_socket()?;
        let datagrams = frame_ump_data(&mut self.session, messages, self.config.max_datagram_size)?;
        for datagram in &datagrams {
            self.send_datagram(&socket, datagram)?;
        }
        for message in messages {
            Metrics::record_ump_sent(message.message_type());
        }
        Ok(())
    }

    /// Send one message
    pub fn send(&mut self, message: &Ump) -> Result<(), TransportError> {
        self.send_many(std::slice::from_ref(message))
    }

    /// Receive the next UMP message, answering control traffic on the way.
    ///
    /// Every command of a datagram is processed before returning, so a bad
    /// UMP payload is reported once the good ones are queued.
    pub fn recv(&mut self) -> Result<Ump, TransportError> {
        loop {
            if let Some(message) = self.rx_queue.pop_front() {
                return Ok(message);
            }
            let socket = self.established_socket()?;
            let commands = self.recv_commands(&socket)?;
            self.handle_commands(&socket, commands)?;
        }
    }

    fn open_socket(&mut self) -> Result<SocketBinding, TransportError> {
        if let Some(socket) = &self.socket {
            return Ok(socket.clone());
        }
        let socket = SocketBinding::bind(self.config.bind_addr)?;
        socket.set_read_timeout(self.config.read_timeout)?;
        socket.set_write_timeout(self.config.write_timeout)?;
        debug!(local = ?socket.local_addr().ok(), "socket bound");
        self.socket = Some(socket.clone());
        Ok(socket)
    }

    fn established_socket(&self) -> Result<SocketBinding, TransportError> {
        match &self.socket {
            Some(socket) if self.session.is_established() => Ok(socket.clone()),
            _ => Err(TransportError::NotConnected),
        }
    }

    fn abort_connect(&mut self, err: TransportError) -> TransportError {
        self.socket = None;
        self.session.reset();
        err
    }

    fn send_commands(
        &self,
        socket: &SocketBinding,
        commands: Vec<CommandPacket>,
    ) -> Result<(), TransportError> {
        self.send_datagram(socket, &MidiUdpPacket::new(commands))
    }

    fn send_datagram(
        &self,
        socket: &SocketBinding,
        datagram: &MidiUdpPacket,
    ) -> Result<(), TransportError> {
        let bytes = datagram.encode();
        socket.send_to(&bytes, self.peer)?;
        Metrics::record_datagram_sent();
        trace!(len = bytes.len(), commands = datagram.commands.len(), "tx datagram");
        Ok(())
    }

    /// Read datagrams until one arrives from the host, then unframe it.
    fn recv_commands(&mut self, socket: &SocketBinding) -> Result<Vec<CommandPacket>, TransportError> {
        loop {
            let (len, from) = socket.recv_from(&mut self.recv_buf)?;
            if from != self.peer {
                trace!(%from, "ignoring datagram from unknown peer");
                continue;
            }
            Metrics::record_datagram_received();
            let datagram = MidiUdpPacket::decode(&self.recv_buf[..len]).inspect_err(|_| {
                Metrics::record_decode_error();
            })?;
            trace!(len, commands = datagram.commands.len(), "rx datagram");
            return Ok(datagram.commands);
        }
    }

    /// Apply inbound commands; returns the payloads of any PING_REPLY.
    fn handle_commands(
        &mut self,
        socket: &SocketBinding,
        commands: Vec<CommandPacket>,
    ) -> Result<Vec<Bytes>, TransportError> {
        let mut pongs = Vec::new();
        let mut first_error = None;
        for command in commands {
            match command.command() {
                CommandCode::Ping => {
                    let reply = command.with_command(CommandCode::PingReply);
                    self.send_commands(socket, vec![reply])?;
                }
                CommandCode::PingReply => pongs.push(command.payload().clone()),
                CommandCode::UmpData => match Ump::from_be_bytes(command.payload()) {
                    Ok(message) => {
                        trace!(sequence = command.aux(), ?message, "rx ump");
                        Metrics::record_ump_received();
                        self.rx_queue.push_back(message);
                    }
                    Err(err) => {
                        Metrics::record_decode_error();
                        warn!(sequence = command.aux(), %err, "undecodable UMP payload");
                        first_error.get_or_insert(TransportError::Codec(err));
                    }
                },
                CommandCode::Bye => {
                    let reason = ByeReason::from_u8(command.aux_high());
                    info!(?reason, "host closed the session");
                    if self.session.is_established() {
                        Metrics::record_session_close();
                    }
                    self.session.set_state(SessionState::Closed);
                    self.socket = None;
                    let reply = vec![CommandPacket::bare(CommandCode::ByeReply, 0)];
                    if let Err(err) = self.send_commands(socket, reply) {
                        warn!(%err, "BYE_REPLY not sent");
                    }
                }
                other => trace!(command = %other, "ignored"),
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(pongs),
        }
    }
}

impl Drop for UdpClient {
    fn drop(&mut self) {
        if self.socket.is_some() && self.session.is_established() {
            let _ = self.disconnect();
        }
    }
}

impl UmpTransport for UdpClient {
    fn send_many(&mut self, messages: &[Ump]) -> Result<(), TransportError> {
        UdpClient::send_many(self, messages)
    }

    fn recv(&mut self) -> Result<Ump, TransportError> {
        UdpClient::recv(self)
    }
}

/// Wrap messages in UMP_DATA commands carrying consecutive sequence numbers
/// and pack them into datagrams of at most `max_datagram_size` bytes.
///
/// Every message is encoded before any sequence number is taken, so a batch
/// holding an unencodable message leaves the session untouched.
pub(crate) fn frame_ump_data(
    session: &mut Session,
    messages: &[Ump],
    max_datagram_size: usize,
) -> Result<Vec<MidiUdpPacket>, TransportError> {
    let payloads = messages
        .iter()
        .map(Ump::to_be_bytes)
        .collect::<Result<Vec<_>, _>>()?;
    let mut datagrams = Vec::new();
    let mut current = MidiUdpPacket::default();
    let mut size = MAGIC.len();
    for payload in payloads {
        let command = CommandPacket::new(CommandCode::UmpData, session.next_sequence(), payload)?;
        if !current.commands.is_empty() && size + command.encoded_len() > max_datagram_size {
            datagrams.push(std::mem::take(&mut current));
            size = MAGIC.len();
        }
        size += command.encoded_len();
        current.commands.push(command);
    }
    if !current.commands.is_empty() {
        datagrams.push(current);
    }
    Ok(datagrams)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ump::{Midi1ChannelVoice, Midi1Message, Midi2ChannelVoice, Midi2Message};

    fn note(n: u8) -> Ump {
        Midi1ChannelVoice::new(0, 0, Midi1Message::NoteOn {
            note: n & 0x7F,
            velocity: 100,
        })
        .into()
    }

    #[test]
    fn sequence_numbers_wrap_after_65535() {
        let mut session = Session::new();
        let messages: Vec<Ump> = (0..(1usize << 16) + 5).map(|i| note(i as u8)).collect();
        let datagrams = frame_ump_data(&mut session, &messages, 1472).unwrap();
        let sequences: Vec<u16> = datagrams
            .iter()
            .flat_map(|d| d.commands.iter().map(CommandPacket::aux))
            .collect();
        assert_eq!(sequences.len(), (1 << 16) + 5);
        assert!(sequences[..1 << 16].iter().enumerate().all(|(i, &s)| s as usize == i));
        assert_eq!(&sequences[1 << 16..], &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn datagrams_respect_size_cap() {
        let mut session = Session::new();
        let messages: Vec<Ump> = (0..200)
            .map(|i| {
                Midi2ChannelVoice::new(0, 0, Midi2Message::ControlChange {
                    controller: (i % 128) as u8,
                    data: i,
                })
                .into()
            })
            .collect();
        let datagrams = frame_ump_data(&mut session, &messages, 100).unwrap();
        // each command is 4 + 8 bytes; 4 magic + 8 * 12 = 100
        assert!(datagrams.iter().all(|d| d.encoded_len() <= 100));
        assert_eq!(datagrams[0].commands.len(), 8);
        let total: usize = datagrams.iter().map(|d| d.commands.len()).sum();
        assert_eq!(total, 200);
    }

    #[test]
    fn oversize_single_message_still_sent() {
        let mut session = Session::new();
        let datagrams = frame_ump_data(&mut session, &[note(1)], 4).unwrap();
        assert_eq!(datagrams.len(), 1);
    }

    #[test]
    fn unencodable_message_consumes_no_sequence_number() {
        let mut session = Session::new();
        let bad: Ump = Midi1ChannelVoice::new(0, 0, Midi1Message::NoteOn {
            note: 200,
            velocity: 1,
        })
        .into();
        let err = frame_ump_data(&mut session, &[note(1), bad], 1472).unwrap_err();
        assert!(matches!(err, TransportError::Codec(_)));

        let datagrams = frame_ump_data(&mut session, &[note(2)], 1472).unwrap();
        assert_eq!(datagrams[0].commands[0].aux(), 0);
    }

    #[test]
    fn operations_need_a_session() {
        let mut client = UdpClient::new("127.0.0.1:5673".parse().unwrap(), ClientConfig::default());
        assert!(matches!(client.send(&note(1)), Err(TransportError::NotConnected)));
        assert!(matches!(client.recv(), Err(TransportError::NotConnected)));
        assert!(matches!(client.disconnect(), Err(TransportError::NotConnected)));
    }
}
