use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dm_sender::recipient::read_recipients;
use dm_sender::template::{personalize_recipient, unresolved_placeholders};
use dm_sender::Recipient;

const TEMPLATE: &str = "Hi @{username}!\n\n\
    I wanted to reach out because I think you'd be interested in {topic}.\n\n\
    {name}, we met at {event} and I remember your talk on {topic}.\n\n\
    Best regards!";

fn personalize_benchmark(c: &mut Criterion) {
    let recipient = Recipient::with_username("@rustacean")
        .field("name", "Ferris")
        .field("topic", "async runtimes")
        .field("event", "RustConf");

    c.bench_function("personalize_recipient_four_fields", |b| {
        b.iter(|| {
            let message = personalize_recipient(black_box(TEMPLATE), black_box(&recipient));
            black_box(message.len());
        });
    });
}

fn placeholder_scan_benchmark(c: &mut Criterion) {
    let message = TEMPLATE.repeat(16);

    c.bench_function("unresolved_placeholders_long_message", |b| {
        b.iter(|| {
            let found = unresolved_placeholders(black_box(&message));
            black_box(found.len());
        });
    });
}

fn recipients_benchmark(c: &mut Criterion) {
    let mut data = String::from("username,name,topic,event\n");
    for i in 0..1000 {
        data.push_str(&format!("user{i},Name {i},topic {i},event {i}\n"));
    }

    c.bench_function("read_recipients_1000_rows", |b| {
        b.iter(|| {
            let recipients = read_recipients(black_box(data.as_bytes()), b',').unwrap();
            black_box(recipients.len());
        });
    });
}

criterion_group!(
    benches,
    personalize_benchmark,
    placeholder_scan_benchmark,
    recipients_benchmark
);
criterion_main!(benches);
