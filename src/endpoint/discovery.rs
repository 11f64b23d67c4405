//! Endpoint topology snapshot and the discovery exchange that fills it.

use tracing::{debug, info, instrument, trace, warn};

use super::chunked::ChunkedField;
use super::function_block::FunctionBlock;
use crate::transport::{TransportError, UmpTransport};
use crate::ump::{
    DeviceIdentity, EndpointFilter, EndpointInfo, FunctionBlockFilter, StreamConfiguration,
    StreamMessage, Ump, UmpStream,
};

/// What an endpoint has told us about itself so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Endpoint {
    name: ChunkedField,
    product_instance_id: ChunkedField,
    info: Option<EndpointInfo>,
    device_identity: Option<DeviceIdentity>,
    stream_configuration: Option<StreamConfiguration>,
    blocks: Vec<Option<FunctionBlock>>,
}

impl Endpoint {
    /// Empty snapshot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run discovery over `transport` and return the resulting snapshot.
    pub fn discover<T>(transport: &mut T, with_names: bool) -> Result<Self, TransportError>
    where
        T: UmpTransport + ?Sized,
    {
        let mut endpoint = Self::new();
        endpoint.rediscover(transport, with_names)?;
        Ok(endpoint)
    }

    /// Forget everything and run discovery again.
    ///
    /// Blocks until the endpoint info and every function block description
    /// have arrived. With `with_names`, it also waits for the endpoint name
    /// and every block name to be fully reassembled.
    #[instrument(level = "debug", skip(self, transport))]
    pub fn rediscover<T>(&mut self, transport: &mut T, with_names: bool) -> Result<(), TransportError>
    where
        T: UmpTransport + ?Sized,
    {
        *self = Self::new();
        transport.send(&UmpStream::endpoint_discovery(EndpointFilter::ALL).into())?;

        while self.info.is_none() {
            let message = transport.recv()?;
            if is_endpoint_info(&message) {
                self.dispatch(&message);
            } else {
                trace!(?message, "discarded before endpoint info");
            }
        }
        debug!(blocks = self.blocks.len(), "endpoint info received");

        let count = self.info.map_or(0, |info| info.function_blocks);
        let requests: Vec<Ump> = (0..count)
            .map(|block| UmpStream::function_block_discovery(block, FunctionBlockFilter::ALL).into())
            .collect();
        if !requests.is_empty() {
            transport.send_many(&requests)?;
        }
        while !self.blocks_complete() {
            self.dispatch(&transport.recv()?);
        }

        // One more info request: its reply trails everything asked for above.
        let info_only = EndpointFilter::from_bits(EndpointFilter::ENDPOINT_INFO);
        transport.send(&UmpStream::endpoint_discovery(info_only).into())?;
        loop {
            let message = transport.recv()?;
            if is_endpoint_info(&message) {
                break;
            }
            self.dispatch(&message);
        }

        if with_names {
            while !self.names_complete() {
                self.dispatch(&transport.recv()?);
            }
        }
        info!(name = %self.name, blocks = self.blocks.len(), "discovery finished");
        Ok(())
    }

    /// Fold one received message into the snapshot.
    ///
    /// Messages that carry no topology are ignored. The block list is sized
    /// by the first endpoint info seen and never changes afterwards; a
    /// reference to a block outside it is logged and dropped.
    pub fn dispatch(&mut self, message: &Ump) {
        let Ump::Stream(UmpStream { form, message }) = message else {
            return;
        };
        match message {
            StreamMessage::EndpointInfo(info) => {
                if self.info.is_none() {
                    self.blocks = vec![None; usize::from(info.function_blocks)];
                    self.info = Some(*info);
                }
            }
            StreamMessage::DeviceIdentity(identity) => self.device_identity = Some(*identity),
            StreamMessage::StreamConfigurationNotification(config) => {
                self.stream_configuration = Some(*config);
            }
            StreamMessage::EndpointName(chunk) => self.name.apply(*form, chunk.as_bytes()),
            StreamMessage::ProductInstanceId(chunk) => {
                self.product_instance_id.apply(*form, chunk.as_bytes());
            }
            StreamMessage::FunctionBlockInfo(info) => {
                let known = self.blocks.len();
                match self.blocks.get_mut(usize::from(info.id)) {
                    Some(Some(block)) => block.update(info),
                    Some(slot) => *slot = Some(FunctionBlock::from_info(info)),
                    None => warn!(block = info.id, known, "info for unknown function block"),
                }
            }
            StreamMessage::FunctionBlockName { block, name } => {
                let known = self.blocks.len();
                match self.blocks.get_mut(usize::from(*block)) {
                    Some(Some(slot)) => slot.name.apply(*form, name.as_bytes()),
                    Some(None) => debug!(block, "name before info"),
                    None => warn!(block, known, "name for unknown function block"),
                }
            }
            _ => {}
        }
    }

    /// Endpoint name
    #[must_use]
    pub fn name(&self) -> &ChunkedField {
        &self.name
    }

    /// Product instance id
    #[must_use]
    pub fn product_instance_id(&self) -> &ChunkedField {
        &self.product_instance_id
    }

    /// Endpoint info, once received
    #[must_use]
    pub fn info(&self) -> Option<&EndpointInfo> {
        self.info.as_ref()
    }

    /// Device identity, if the endpoint sent one
    #[must_use]
    pub fn device_identity(&self) -> Option<&DeviceIdentity> {
        self.device_identity.as_ref()
    }

    /// Last stream configuration notification
    #[must_use]
    pub fn stream_configuration(&self) -> Option<&StreamConfiguration> {
        self.stream_configuration.as_ref()
    }

    /// Function block slots in id order
    #[must_use]
    pub fn blocks(&self) -> &[Option<FunctionBlock>] {
        &self.blocks
    }

    /// Described blocks covering `group`
    pub fn blocks_for_group(&self, group: u8) -> impl Iterator<Item = &FunctionBlock> {
        self.blocks
            .iter()
            .flatten()
            .filter(move |block| block.covers_group(group))
    }

    /// Endpoint info seen and every block slot filled
    #[must_use]
    pub fn blocks_complete(&self) -> bool {
        self.info.is_some() && self.blocks.iter().all(Option::is_some)
    }

    /// Endpoint name and every block name fully reassembled
    #[must_use]
    pub fn names_complete(&self) -> bool {
        self.name.is_complete()
            && self
                .blocks
                .iter()
                .all(|slot| slot.as_ref().is_some_and(|block| block.name.is_complete()))
    }
}

fn is_endpoint_info(message: &Ump) -> bool {
    matches!(
        message,
        Ump::Stream(UmpStream {
            message: StreamMessage::EndpointInfo(_),
            ..
        })
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ump::{Form, FunctionBlockInfo, Midi1Mode, TextChunk, UmpVersion};

    fn endpoint_info(blocks: u8) -> Ump {
        UmpStream::new(StreamMessage::EndpointInfo(EndpointInfo {
            version: UmpVersion::V1_1,
            static_blocks: true,
            function_blocks: blocks,
            midi2: true,
            midi1: true,
            rx_jr: false,
            tx_jr: false,
        }))
        .into()
    }

    fn block_info(id: u8) -> Ump {
        UmpStream::new(StreamMessage::FunctionBlockInfo(FunctionBlockInfo {
            active: true,
            id,
            ui_hint_sender: true,
            ui_hint_receiver: true,
            midi1: Midi1Mode::NotMidi1,
            is_output: true,
            is_input: true,
            first_group: id,
            group_count: 1,
            midi_ci_version: 0,
            max_sysex8_streams: 0,
        }))
        .into()
    }

    fn name_chunk(form: Form, text: &str) -> Ump {
        UmpStream {
            form,
            message: StreamMessage::EndpointName(TextChunk::try_from(text).unwrap()),
        }
        .into()
    }

    #[test]
    fn endpoint_name_reassembles() {
        let mut endpoint = Endpoint::new();
        endpoint.dispatch(&name_chunk(Form::Start, "Euro"));
        assert!(!endpoint.name().is_complete());
        endpoint.dispatch(&name_chunk(Form::End, "rack"));
        assert_eq!(endpoint.name().as_str(), Some("Eurorack"));
    }

    #[test]
    fn unknown_block_is_dropped() {
        let mut endpoint = Endpoint::new();
        endpoint.dispatch(&endpoint_info(4));
        endpoint.dispatch(&block_info(9));
        assert_eq!(endpoint.blocks().len(), 4);
        assert!(endpoint.blocks().iter().all(Option::is_none));
        for name in UmpStream::function_block_name(9, "ghost") {
            endpoint.dispatch(&name.into());
        }
        assert_eq!(endpoint.blocks().len(), 4);
    }

    #[test]
    fn slot_list_is_fixed_by_first_info() {
        let mut endpoint = Endpoint::new();
        endpoint.dispatch(&endpoint_info(2));
        endpoint.dispatch(&endpoint_info(8));
        assert_eq!(endpoint.blocks().len(), 2);
        assert_eq!(endpoint.info().map(|i| i.function_blocks), Some(2));
    }

    #[test]
    fn blocks_and_names() {
        let mut endpoint = Endpoint::new();
        endpoint.dispatch(&endpoint_info(2));
        endpoint.dispatch(&block_info(0));
        assert!(!endpoint.blocks_complete());
        endpoint.dispatch(&block_info(1));
        assert!(endpoint.blocks_complete());
        assert!(!endpoint.names_complete());

        for name in UmpStream::endpoint_name("A rather long endpoint name") {
            endpoint.dispatch(&name.into());
        }
        for (id, text) in [(0, "Keys"), (1, "Drum pads and knobs")] {
            for name in UmpStream::function_block_name(id, text) {
                endpoint.dispatch(&name.into());
            }
        }
        assert!(endpoint.names_complete());
        assert_eq!(endpoint.name().as_str(), Some("A rather long endpoint name"));
        assert_eq!(
            endpoint.blocks()[1].as_ref().and_then(|b| b.name.as_str()),
            Some("Drum pads and knobs")
        );
        assert_eq!(endpoint.blocks_for_group(1).count(), 1);
    }

    #[test]
    fn non_stream_messages_are_ignored() {
        let mut endpoint = Endpoint::new();
        let note: Ump = crate::ump::Midi1ChannelVoice::new(
            0,
            0,
            crate::ump::Midi1Message::NoteOn { note: 60, velocity: 1 },
        )
        .into();
        endpoint.dispatch(&note);
        assert_eq!(endpoint, Endpoint::new());
    }
}
