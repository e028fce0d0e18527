use animgraph_core::{decode, encode, validate_json, Config, NullResolver};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Document with `n` copies of a locomotion cycle, each with its own tree.
fn synthetic_document(n: usize) -> String {
    let mut transitions = Vec::with_capacity(n * 2);
    for i in 0..n {
        let tree = format!(
            r#"{{"type":"blendtree","animationname":"Move{i}","blendtree":{{"blendtype":"oned","parametername":"Speed","motions":[{{"animationname":"Walk","threshold":0}},{{"animationname":"Run","threshold":1}}]}}}}"#
        );
        let idle = format!(r#"{{"type":"animation","animationname":"Idle{i}"}}"#);
        transitions.push(format!(
            r#"{{"startstate":{idle},"endstate":{tree},"conditions":[{{"name":"Speed","type":"float","numbervalue":0.1,"comparison":"greater"}}]}}"#
        ));
        transitions.push(format!(
            r#"{{"startstate":{tree},"endstate":{idle},"conditions":[{{"name":"Jump","type":"trigger"}}]}}"#
        ));
    }
    format!(r#"{{"Transitions":[{}]}}"#, transitions.join(","))
}

fn bench_codec(c: &mut Criterion) {
    let config = Config::default();
    let text = synthetic_document(200);

    c.bench_function("validate_400_transitions", |b| {
        b.iter(|| black_box(validate_json(black_box(&text))))
    });

    c.bench_function("decode_400_transitions", |b| {
        b.iter(|| black_box(decode(black_box(&text), &mut NullResolver, &config)))
    });

    let graph = match decode(&text, &mut NullResolver, &config) {
        Ok(graph) => graph,
        Err(err) => panic!("synthetic document should decode: {err}"),
    };
    c.bench_function("encode_400_transitions", |b| {
        b.iter(|| black_box(encode(black_box(&graph))))
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
