// Run:
//   cargo bench --bench profile_convert -- --profile-time=5
//
//
// Use one the following to display the results:
//   ~/go/bin/pprof -svg ./target/criterion/profile_convert\ 10000\ records/profile/profile.pb
//      + use firefox to open file `profile001.svg`
// Or
//   ~/go/bin/pprof -http "0.0.0.0:8081" ./target/criterion/profile_convert\ 10000\ records/profile/profile.pb
//      + connect to 127.0.0.1:8081

use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use sniffer_pcapng::convert;

fn capture(records: usize) -> String {
    let mut s = String::new();
    for i in 0..records {
        s.push_str(&format!(
            "{}.{:06} port1 out 127.0.0.1 -> 127.0.0.1: udp\n\
             0x0000   4500 0014 0000 4000 4011 0000 7f00 0001   E.....@.@.......\n\
             0x0010   7f00 0001                                 ....\n",
            i / 1000,
            i % 1000
        ));
    }
    s
}

fn profile_convert(c: &mut Criterion) {
    let input = capture(10_000);
    c.bench_function("profile_convert 10000 records", |b| {
        b.iter(|| {
            let conversion = convert(input.as_bytes()).expect("conversion failed");
            assert_eq!(conversion.packet_count, 10_000);
        })
    });
}

fn profiled() -> Criterion {
    //Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
    Criterion::default().with_profiler(PProfProfiler::new(100, Output::Protobuf))
}

criterion_group! {
    name = benches;
    config = profiled();
    targets = profile_convert
}
criterion_main!(benches);
