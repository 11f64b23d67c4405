use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use netmidi2::ump::{
    Data64, FlexAddress, FlexData, FlexMessage, Form, MetadataTextStatus, Midi1ChannelVoice,
    Midi1Message, Midi2ChannelVoice, Midi2Message, SystemKind, SystemRealTime, Ump, UmpStream,
    decode_all,
};

fn samples() -> Vec<(&'static str, Ump)> {
    vec![
        (
            "system",
            SystemRealTime::new(0, SystemKind::TimingClock).into(),
        ),
        (
            "midi1_note_on",
            Midi1ChannelVoice::new(2, 4, Midi1Message::NoteOn {
                note: 60,
                velocity: 100,
            })
            .into(),
        ),
        (
            "midi2_note_on",
            Midi2ChannelVoice::new(0, 9, Midi2Message::NoteOn {
                note: 36,
                velocity: 0xFFFF,
                attribute_type: 3,
                attribute_data: 0x1234,
            })
            .into(),
        ),
        (
            "sysex7",
            Data64::new(0, Form::Complete, &[0x7E, 0x7F, 0x06, 0x01])
                .unwrap()
                .into(),
        ),
        (
            "stream_name",
            UmpStream::endpoint_name("Bench endpoint")
                .remove(0)
                .into(),
        ),
        (
            "flex_text",
            FlexData::text(
                0,
                FlexAddress::Group,
                0,
                FlexMessage::MetadataText(MetadataTextStatus::SongName),
                "Short song",
            )
            .remove(0)
            .into(),
        ),
    ]
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("ump");
    for (name, message) in samples() {
        group.bench_function(format!("encode_{name}"), |b| {
            b.iter(|| {
                let mut words = [0u32; 4];
                black_box(&message).encode_into(&mut words).unwrap();
                black_box(words);
            });
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("ump");
    for (name, message) in samples() {
        let words = message.encode().unwrap();
        group.bench_function(format!("decode_{name}"), |b| {
            b.iter(|| {
                black_box(Ump::decode(black_box(&words)).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("ump");

    // Mixed traffic, roughly what a busy keyboard produces
    let words: Vec<u32> = samples()
        .into_iter()
        .map(|(_, message)| message)
        .cycle()
        .take(1024)
        .flat_map(|message| message.encode().unwrap())
        .collect();
    group.throughput(Throughput::Bytes((words.len() * 4) as u64));
    group.bench_function("decode_all_1024", |b| {
        b.iter(|| {
            let count = decode_all(black_box(&words)).filter(Result::is_ok).count();
            black_box(count);
        });
    });

    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("words_from_be_bytes", |b| {
        b.iter(|| {
            black_box(netmidi2::ump::words_from_be_bytes(black_box(&bytes)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_stream);
criterion_main!(benches);
