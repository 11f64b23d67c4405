//! Minimal host: accepts invitations, answers pings and collects UMP data.

use std::net::SocketAddr;

use tracing::{debug, info, instrument, trace, warn};

use super::client::frame_ump_data;
use super::command::{ByeReason, CommandPacket, MidiUdpPacket};
use super::config::{DEFAULT_MAX_DATAGRAM_SIZE, HostConfig, RECV_BUFFER_SIZE};
use super::error::TransportError;
use super::metrics::Metrics;
use super::session::{Dispatch, Identity, SessionError, SessionTable};
use super::socket::SocketBinding;
use crate::ump::Ump;

/// UDP host serving any number of client sessions on one socket.
#[derive(Debug)]
pub struct Host {
    socket: SocketBinding,
    sessions: SessionTable,
    recv_buf: Vec<u8>,
}

impl Host {
    /// Bind the host socket.
    pub fn bind(config: HostConfig) -> Result<Self, TransportError> {
        let socket = SocketBinding::bind(config.bind_addr)?;
        socket.set_read_timeout(config.read_timeout)?;
        info!(local = ?socket.local_addr().ok(), name = %config.name, "host listening");
        Ok(Self {
            socket,
            sessions: SessionTable::new(Identity::new(config.name, config.product_instance_id)),
            recv_buf: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    /// Bound address
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Current client sessions
    #[must_use]
    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Receive and process one datagram.
    ///
    /// Returns the UMP messages it carried together with the sender. A
    /// malformed datagram, or a command the session table rejects, is logged
    /// and skipped rather than reported. Only a failed receive is an error.
    pub fn serve_once(&mut self) -> Result<Vec<(SocketAddr, Ump)>, TransportError> {
        let (len, peer) = self.socket.recv_from(&mut self.recv_buf)?;
        Metrics::record_datagram_received();
        let datagram = match MidiUdpPacket::decode(&self.recv_buf[..len]) {
            Ok(datagram) => datagram,
            Err(err) => {
                Metrics::record_decode_error();
                warn!(%peer, %err, "dropping malformed datagram");
                return Ok(Vec::new());
            }
        };
        Ok(self.handle_datagram(peer, &datagram))
    }

    /// Apply every command of one datagram from `peer`.
    ///
    /// Replies are sent best effort: a failed send is logged and the UMP
    /// messages the datagram carried are still returned.
    fn handle_datagram(
        &mut self,
        peer: SocketAddr,
        datagram: &MidiUdpPacket,
    ) -> Vec<(SocketAddr, Ump)> {
        let mut replies = Vec::new();
        let mut delivered = Vec::new();
        for command in &datagram.commands {
            match self.sessions.dispatch(peer, command) {
                Ok(Dispatch { reply, delivered: ump }) => {
                    replies.extend(reply);
                    delivered.extend(ump.map(|ump| (peer, ump)));
                }
                Err(err) => {
                    if matches!(err, SessionError::Codec(_)) {
                        Metrics::record_decode_error();
                    }
                    warn!(%peer, command = %command.command(), %err, "command rejected");
                }
            }
        }
        if !replies.is_empty() {
            if let Err(err) = self.send_datagram(peer, &MidiUdpPacket::new(replies)) {
                warn!(%peer, %err, "reply not sent");
            }
        }
        delivered
    }

    /// Serve until a socket error other than a read timeout occurs.
    #[instrument(level = "info", skip_all)]
    pub fn run<F>(&mut self, mut on_ump: F) -> Result<(), TransportError>
    where
        F: FnMut(SocketAddr, Ump),
    {
        loop {
            match self.serve_once() {
                Ok(messages) => {
                    for (peer, ump) in messages {
                        on_ump(peer, ump);
                    }
                }
                Err(TransportError::Socket(err)) if err.is_timeout() => {
                    trace!("idle");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send messages to a client with an established session.
    pub fn send(&mut self, peer: SocketAddr, messages: &[Ump]) -> Result<(), TransportError> {
        let session = self
            .sessions
            .get_mut(&peer)
            .filter(|session| session.is_established())
            .ok_or(TransportError::NotConnected)?;
        let datagrams = frame_ump_data(session, messages, DEFAULT_MAX_DATAGRAM_SIZE)?;
        for datagram in &datagrams {
            self.send_datagram(peer, datagram)?;
        }
        for message in messages {
            Metrics::record_ump_sent(message.message_type());
        }
        Ok(())
    }

    /// End a client session with BYE.
    pub fn close(&mut self, peer: SocketAddr, reason: ByeReason) -> Result<(), TransportError> {
        if !self.sessions.remove(&peer) {
            return Err(TransportError::NotConnected);
        }
        Metrics::record_session_close();
        debug!(%peer, ?reason, "closing session");
        self.send_datagram(peer, &MidiUdpPacket::new(vec![CommandPacket::bye(reason)]))
    }

    fn send_datagram(&self, peer: SocketAddr, datagram: &MidiUdpPacket) -> Result<(), TransportError> {
        let bytes = datagram.encode();
        self.socket.send_to(&bytes, peer)?;
        Metrics::record_datagram_sent();
        trace!(%peer, len = bytes.len(), "tx datagram");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ClientCapabilities, CommandCode};
    use crate::ump::{Midi1ChannelVoice, Midi1Message};

    #[test]
    fn failed_reply_keeps_delivered_messages() {
        let mut host = Host::bind(HostConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..HostConfig::default()
        })
        .unwrap();
        // an IPv4 socket cannot send to an IPv6 peer, so the reply fails
        let peer: SocketAddr = "[::1]:5004".parse().unwrap();
        let invitation = Identity::new("client", "abc")
            .to_command(CommandCode::Invitation, ClientCapabilities::default())
            .unwrap();
        let ump = Ump::from(Midi1ChannelVoice::new(0, 3, Midi1Message::NoteOn {
            note: 60,
            velocity: 100,
        }));
        let data = CommandPacket::new(CommandCode::UmpData, 0, ump.to_be_bytes().unwrap()).unwrap();

        let delivered = host.handle_datagram(peer, &MidiUdpPacket::new(vec![invitation, data]));
        assert_eq!(delivered, vec![(peer, ump)]);
        assert_eq!(host.sessions().len(), 1);
    }
}
