//! The line protocol end to end: a model served over a socket, driven by
//! the same client the process backend uses.
#![cfg(unix)]

use std::io::BufReader;
use std::os::unix::net::UnixStream;
use std::thread;

use vigil_actions::Sequence;
use vigil_backend::{Backend, BackendContext, InteractiveBackend, LiveSim, LiveSimError, ModelSim, ProcessSim};
use vigil_conformance::{mirror, run_interactive, tuple_ab};
use vigil_value::Value;

fn socket_backend() -> InteractiveBackend {
    InteractiveBackend::with_factory("socket", |program, _ctx| {
        let (client, server) = UnixStream::pair()?;
        let mut model = ModelSim::new(program.circuit(), mirror)
            .map_err(|e| LiveSimError::Protocol(e.to_string()))?;
        thread::spawn(move || {
            let mut input = BufReader::new(server.try_clone()?);
            let mut output = server;
            model.serve(&mut input, &mut output)
        });
        let reader = BufReader::new(client.try_clone()?);
        Ok(Box::new(ProcessSim::new(reader, client)) as Box<dyn LiveSim>)
    })
}

fn scenario() -> vigil_actions::Program {
    let mut seq = Sequence::new(tuple_ab());
    seq.poke(
        "I".parse().unwrap(),
        Value::tuple([("a", Value::Int(5)), ("b", Value::Int(200))]),
    )
    .unwrap();
    seq.eval().unwrap();
    seq.expect("O.a".parse().unwrap(), 5).unwrap();
    seq.expect("O.b".parse().unwrap(), 201).unwrap();
    seq.print("O".parse().unwrap()).unwrap();
    seq.finalize()
}

#[test]
fn socket_run_matches_in_process_run() {
    let program = scenario();
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = BackendContext::new(tmp.path().join("socket"));
    let artifact = socket_backend().emit(&program, &mut ctx).unwrap();
    let over_socket = artifact.transcript.unwrap();

    let in_process = run_interactive(&program, &tmp.path().join("model"), false).unwrap();

    assert!(over_socket.finished);
    assert_eq!(over_socket.mismatches.len(), 1);
    assert_eq!(over_socket.mismatches[0].signal, "O.b");
    assert_eq!(over_socket.mismatches[0].actual, "200");
    assert_eq!(over_socket.prints, in_process.prints);
    assert_eq!(over_socket.mismatches, in_process.mismatches);
    assert_eq!(over_socket.verdict(), in_process.verdict());
}

#[test]
fn dead_peer_interrupts_the_run() {
    let backend = InteractiveBackend::with_factory("dead", |_program, _ctx| {
        let (client, server) = UnixStream::pair()?;
        drop(server);
        let reader = BufReader::new(client.try_clone()?);
        Ok(Box::new(ProcessSim::new(reader, client)) as Box<dyn LiveSim>)
    });
    let tmp = tempfile::tempdir().unwrap();
    let mut ctx = BackendContext::new(tmp.path());
    let err = backend.emit(&scenario(), &mut ctx).unwrap_err();
    assert!(
        matches!(err, vigil_backend::BackendError::Interrupted { index: 0, .. }),
        "{err}"
    );
}
