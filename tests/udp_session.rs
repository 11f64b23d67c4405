use std::net::{SocketAddr, UdpSocket};
use std::thread;
use std::time::Duration;

use sha2::{Digest, Sha256};

use netmidi2::transport::{
    ByeReason, ClientConfig, CommandCode, CommandPacket, Credentials, Host, HostConfig, Identity,
    MidiUdpPacket, SessionState, TransportError, UdpClient,
};
use netmidi2::ump::{Midi1ChannelVoice, Midi1Message, Midi2ChannelVoice, Midi2Message, Ump};

const TIMEOUT: Duration = Duration::from_secs(2);

fn fake_host() -> (UdpSocket, SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(TIMEOUT)).unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, addr)
}

fn recv_datagram(socket: &UdpSocket) -> (MidiUdpPacket, SocketAddr) {
    let mut buf = [0u8; 1500];
    let (len, from) = socket.recv_from(&mut buf).unwrap();
    (MidiUdpPacket::decode(&buf[..len]).unwrap(), from)
}

fn send_commands(socket: &UdpSocket, to: SocketAddr, commands: Vec<CommandPacket>) {
    socket
        .send_to(&MidiUdpPacket::new(commands).encode(), to)
        .unwrap();
}

fn client_config() -> ClientConfig {
    ClientConfig {
        read_timeout: Some(TIMEOUT),
        ..ClientConfig::default()
    }
}

fn accepted() -> CommandPacket {
    Identity::new("Fake host", "fake-1")
        .to_command(CommandCode::InvitationReplyAccepted, Default::default())
        .unwrap()
}

fn note_on(note: u8) -> Ump {
    Midi1ChannelVoice::new(0, 0, Midi1Message::NoteOn { note, velocity: 90 }).into()
}

#[test]
fn challenge_without_secret_fails_quietly() {
    let (host, addr) = fake_host();
    let script = thread::spawn(move || {
        let (invitation, client) = recv_datagram(&host);
        assert_eq!(invitation.commands[0].command(), CommandCode::Invitation);
        let challenge =
            CommandPacket::new(CommandCode::InvitationReplyAuthRequired, 0, vec![7u8; 16]).unwrap();
        send_commands(&host, client, vec![challenge]);

        host.set_read_timeout(Some(Duration::from_millis(300)))
            .unwrap();
        let mut buf = [0u8; 64];
        host.recv_from(&mut buf).is_err()
    });

    let mut client = UdpClient::new(addr, client_config());
    let err = client.connect().unwrap_err();
    assert!(matches!(err, TransportError::SharedSecretRequired));
    assert!(err.is_auth());
    assert!(script.join().unwrap(), "client sent a packet after failing");
    assert_eq!(client.session().state(), SessionState::Idle);
}

#[test]
fn challenge_with_user_auth_needs_user() {
    let (host, addr) = fake_host();
    let script = thread::spawn(move || {
        let (_, client) = recv_datagram(&host);
        let challenge =
            CommandPacket::new(CommandCode::InvitationReplyUserAuthRequired, 0, vec![1u8; 16])
                .unwrap();
        send_commands(&host, client, vec![challenge]);
    });

    let config = ClientConfig {
        credentials: Some(Credentials::SharedSecret("secret".into())),
        ..client_config()
    };
    let mut client = UdpClient::new(addr, config);
    assert!(matches!(
        client.connect(),
        Err(TransportError::UserAuthRequired)
    ));
    script.join().unwrap();
}

#[test]
fn challenge_with_secret_sends_one_digest() {
    let (host, addr) = fake_host();
    let challenge: Vec<u8> = (0u8..16).collect();
    let expected = Sha256::new()
        .chain_update(&challenge)
        .chain_update(b"opensesame")
        .finalize()
        .to_vec();

    let script = thread::spawn(move || {
        let (_, client) = recv_datagram(&host);
        let packet =
            CommandPacket::new(CommandCode::InvitationReplyAuthRequired, 0, challenge).unwrap();
        send_commands(&host, client, vec![packet]);

        let (answer, _) = recv_datagram(&host);
        assert_eq!(answer.commands.len(), 1);
        let auth = &answer.commands[0];
        assert_eq!(auth.command(), CommandCode::InvitationWithAuth);
        assert_eq!(auth.payload().as_ref(), expected.as_slice());
        send_commands(&host, client, vec![accepted()]);

        let (bye, _) = recv_datagram(&host);
        assert_eq!(bye.commands[0].command(), CommandCode::Bye);
        assert_eq!(bye.commands[0].aux_high(), ByeReason::UserTerminated.as_u8());
    });

    let config = ClientConfig {
        credentials: Some(Credentials::SharedSecret("opensesame".into())),
        ..client_config()
    };
    let mut client = UdpClient::new(addr, config);
    client.connect().unwrap();
    assert!(client.session().is_established());
    assert_eq!(
        client.session().remote().map(|id| id.name.as_str()),
        Some("Fake host")
    );
    client.disconnect().unwrap();
    script.join().unwrap();
    assert!(matches!(
        client.disconnect(),
        Err(TransportError::NotConnected)
    ));
}

#[test]
fn bad_ump_is_reported_after_good_ones_are_queued() {
    let (host, addr) = fake_host();
    let script = thread::spawn(move || {
        let (_, client) = recv_datagram(&host);
        send_commands(&host, client, vec![accepted()]);
        let good = |n| {
            CommandPacket::new(CommandCode::UmpData, u16::from(n), note_on(n).to_be_bytes().unwrap())
                .unwrap()
        };
        let bad = CommandPacket::new(CommandCode::UmpData, 1, vec![0x80, 0, 0, 0, 0, 0, 0, 0])
            .unwrap();
        send_commands(&host, client, vec![good(0), bad, good(2)]);
    });

    let mut client = UdpClient::new(addr, client_config());
    client.connect().unwrap();
    assert!(matches!(client.recv(), Err(TransportError::Codec(_))));
    assert_eq!(client.recv().unwrap(), note_on(0));
    assert_eq!(client.recv().unwrap(), note_on(2));
    script.join().unwrap();
}

#[test]
fn client_answers_ping_while_receiving() {
    let (host, addr) = fake_host();
    let script = thread::spawn(move || {
        let (_, client) = recv_datagram(&host);
        send_commands(&host, client, vec![accepted()]);
        let ping = CommandPacket::new(CommandCode::Ping, 0, vec![9, 9, 9, 9]).unwrap();
        let data =
            CommandPacket::new(CommandCode::UmpData, 0, note_on(64).to_be_bytes().unwrap()).unwrap();
        send_commands(&host, client, vec![ping, data]);
        let (reply, _) = recv_datagram(&host);
        assert_eq!(reply.commands[0].command(), CommandCode::PingReply);
        assert_eq!(reply.commands[0].payload().as_ref(), &[9, 9, 9, 9]);
    });

    let mut client = UdpClient::new(addr, client_config());
    client.connect().unwrap();
    assert_eq!(client.recv().unwrap(), note_on(64));
    script.join().unwrap();
}

#[test]
fn client_and_host_exchange_messages() {
    let mut host = Host::bind(HostConfig {
        name: "Loopback host".into(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        read_timeout: Some(TIMEOUT),
        ..HostConfig::default()
    })
    .unwrap();
    let addr = host.local_addr().unwrap();

    let server = thread::spawn(move || {
        let mut received = Vec::new();
        // until three messages arrived and the client said goodbye
        while received.len() < 3 || !host.sessions().is_empty() {
            received.extend(host.serve_once().unwrap());
        }
        received
    });

    let messages: Vec<Ump> = vec![
        note_on(60),
        Midi2ChannelVoice::new(1, 2, Midi2Message::PitchBend { value: 0x8000_0000 }).into(),
        note_on(62),
    ];
    let mut client = UdpClient::new(addr, client_config());
    client.ping().unwrap();
    client.connect().unwrap();
    assert_eq!(
        client.session().remote().map(|id| id.name.as_str()),
        Some("Loopback host")
    );
    assert!(matches!(client.connect(), Err(TransportError::AlreadyConnected)));
    client.send_many(&messages).unwrap();
    client.disconnect().unwrap();

    let received = server.join().unwrap();
    let local = received[0].0;
    assert!(received.iter().all(|(peer, _)| *peer == local));
    let umps: Vec<Ump> = received.into_iter().map(|(_, ump)| ump).collect();
    assert_eq!(umps, messages);
}

#[test]
fn host_pushes_data_and_closes() {
    let mut host = Host::bind(HostConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        read_timeout: Some(TIMEOUT),
        ..HostConfig::default()
    })
    .unwrap();
    let addr = host.local_addr().unwrap();

    let server = thread::spawn(move || {
        while host.sessions().is_empty() {
            host.serve_once().unwrap();
        }
        let peer = *host.sessions().iter().next().unwrap().0;
        host.send(peer, &[note_on(48)]).unwrap();
        host.close(peer, ByeReason::PowerDown).unwrap();
        assert!(host.sessions().is_empty());
    });

    let mut client = UdpClient::new(addr, client_config());
    client.connect().unwrap();
    assert_eq!(client.recv().unwrap(), note_on(48));
    server.join().unwrap();
    assert!(matches!(client.recv(), Err(TransportError::NotConnected)));
    assert_eq!(client.session().state(), SessionState::Closed);
}

#[test]
fn host_bye_leaves_nothing_to_disconnect() {
    let (host, addr) = fake_host();
    let script = thread::spawn(move || {
        let (_, client) = recv_datagram(&host);
        send_commands(&host, client, vec![accepted()]);
        send_commands(&host, client, vec![CommandPacket::bye(ByeReason::PowerDown)]);
        let (reply, _) = recv_datagram(&host);
        assert_eq!(reply.commands.len(), 1);
        assert_eq!(reply.commands[0].command(), CommandCode::ByeReply);

        // no second BYE from disconnect() or drop
        host.set_read_timeout(Some(Duration::from_millis(200))).unwrap();
        let mut buf = [0u8; 1500];
        assert!(host.recv_from(&mut buf).is_err());
    });

    let mut client = UdpClient::new(addr, client_config());
    client.connect().unwrap();
    assert!(matches!(client.recv(), Err(TransportError::NotConnected)));
    assert_eq!(client.session().state(), SessionState::Closed);
    assert!(matches!(client.disconnect(), Err(TransportError::NotConnected)));
    drop(client);
    script.join().unwrap();
}
