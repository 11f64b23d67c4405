//! Message-level transport interface shared by the UDP client and raw devices.

use super::error::TransportError;
use crate::ump::Ump;

/// Send and receive whole UMP messages.
///
/// Implementations block until the operation completes; callers wanting a
/// deadline configure it on the underlying socket or device.
pub trait UmpTransport {
    /// Send several messages, coalescing them where the transport allows.
    fn send_many(&mut self, messages: &[Ump]) -> Result<(), TransportError>;

    /// Receive the next message.
    fn recv(&mut self) -> Result<Ump, TransportError>;

    /// Send one message.
    fn send(&mut self, message: &Ump) -> Result<(), TransportError> {
        self.send_many(std::slice::from_ref(message))
    }
}

impl<T: UmpTransport + ?Sized> UmpTransport for &mut T {
    fn send_many(&mut self, messages: &[Ump]) -> Result<(), TransportError> {
        (**self).send_many(messages)
    }

    fn recv(&mut self) -> Result<Ump, TransportError> {
        (**self).recv()
    }

    fn send(&mut self, message: &Ump) -> Result<(), TransportError> {
        (**self).send(message)
    }
}

impl<T: UmpTransport + ?Sized> UmpTransport for Box<T> {
    fn send_many(&mut self, messages: &[Ump]) -> Result<(), TransportError> {
        (**self).send_many(messages)
    }

    fn recv(&mut self) -> Result<Ump, TransportError> {
        (**self).recv()
    }

    fn send(&mut self, message: &Ump) -> Result<(), TransportError> {
        (**self).send(message)
    }
}
