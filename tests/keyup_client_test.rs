use std::cell::{Cell, RefCell};
use std::rc::Rc;

use specific_keyup::js::{ClientOptions, LocalSession};
use specific_keyup::{
    Feature, KeySpecificKeyup, KeySpecificKeyupImmediate, KeyboardEvent, KeyupError,
    SYNTHETIC_EVENT,
};

fn session(options: ClientOptions) -> LocalSession {
    LocalSession::new(options).expect("session")
}

#[test]
fn matching_key_dispatches_once() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");
    input
        .attach_key_specific_keyup_event(["Enter", "Tab"])
        .expect("attach");
    session.pump();

    session.key_up("field", "Enter").expect("key up");
    assert_eq!(
        session
            .client()
            .dispatch_count("field", SYNTHETIC_EVENT)
            .unwrap(),
        1
    );

    session.key_up("field", "a").expect("key up");
    assert_eq!(
        session
            .client()
            .dispatch_count("field", SYNTHETIC_EVENT)
            .unwrap(),
        1
    );
    assert_eq!(session.client().dispatch_count("field", "keyup").unwrap(), 2);
}

#[test]
fn key_match_is_case_sensitive() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");
    input.attach_key_specific_keyup_event(["Enter"]).expect("attach");

    session.key_up("field", "enter").expect("key up");
    session.key_up("field", "ENTER").expect("key up");

    assert_eq!(
        session
            .client()
            .dispatch_count("field", SYNTHETIC_EVENT)
            .unwrap(),
        0
    );
}

#[test]
fn payload_callback_receives_matched_key() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");
    input
        .attach_key_specific_keyup_event(["Enter", "Tab"])
        .expect("attach");

    let received = Rc::new(RefCell::new(Vec::<KeyboardEvent>::new()));
    let sink = Rc::clone(&received);
    input
        .on()
        .key_specific_keyup(move |event| sink.borrow_mut().push(event))
        .expect("subscribe");

    let invoked = session
        .key_up_with(
            "field",
            &KeyboardEvent {
                key: "Tab".into(),
                code: "Tab".into(),
                shift_key: true,
                ..KeyboardEvent::default()
            },
        )
        .expect("key up");

    assert_eq!(invoked, 1);
    let received = received.borrow();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].key, "Tab");
    assert_eq!(received[0].code, "Tab");
    assert_eq!(received[0].event_type, "keyup");
    assert!(received[0].shift_key);
}

#[test]
fn immediate_callback_fires_once_alongside_payload_callbacks() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");
    input.attach_key_specific_keyup_event(["Enter"]).expect("attach");

    let immediate = Rc::new(Cell::new(0));
    let decoded = Rc::new(Cell::new(0));
    for _ in 0..3 {
        let counter = Rc::clone(&decoded);
        input
            .on()
            .key_specific_keyup(move |_| counter.set(counter.get() + 1))
            .expect("subscribe");
    }
    let counter = Rc::clone(&immediate);
    input
        .on_immediate()
        .key_specific_keyup(move || counter.set(counter.get() + 1))
        .expect("subscribe");

    let invoked = session.key_up("field", "Enter").expect("key up");

    assert_eq!(invoked, 4);
    assert_eq!(immediate.get(), 1);
    assert_eq!(decoded.get(), 3);
}

#[test]
fn non_matching_key_invokes_nothing() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");
    input.attach_key_specific_keyup_event(["Enter"]).expect("attach");
    input
        .on()
        .key_specific_keyup(|_| panic!("unexpected callback"))
        .expect("subscribe");
    input
        .on_immediate()
        .key_specific_keyup(|| panic!("unexpected callback"))
        .expect("subscribe");

    assert_eq!(session.key_up("field", "a").expect("key up"), 0);
}

#[test]
fn legacy_runtime_behaves_the_same() {
    let mut session = session(ClientOptions {
        legacy_events: true,
    });
    let input = session.input("field", "input").expect("input");
    input.attach_key_specific_keyup_event(["Escape"]).expect("attach");

    let keys = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&keys);
    input
        .on()
        .key_specific_keyup(move |event| sink.borrow_mut().push(event.key))
        .expect("subscribe");
    let immediate = Rc::new(Cell::new(0));
    let counter = Rc::clone(&immediate);
    input
        .on_immediate()
        .key_specific_keyup(move || counter.set(counter.get() + 1))
        .expect("subscribe");

    assert_eq!(session.key_up("field", "Escape").expect("key up"), 2);
    assert_eq!(session.key_up("field", "Enter").expect("key up"), 0);

    assert_eq!(*keys.borrow(), ["Escape"]);
    assert_eq!(immediate.get(), 1);
    assert_eq!(
        session
            .client()
            .dispatch_count("field", SYNTHETIC_EVENT)
            .unwrap(),
        1
    );
}

#[test]
fn duplicate_keys_dispatch_like_single_key() {
    let mut session = session(ClientOptions::default());
    let single = session.input("single", "input").expect("input");
    let doubled = session.input("doubled", "input").expect("input");
    single.attach_key_specific_keyup_event(["Enter"]).expect("attach");
    doubled
        .attach_key_specific_keyup_event(["Enter", "Enter"])
        .expect("attach");

    let hits = Rc::new(RefCell::new(Vec::new()));
    for input in [&single, &doubled] {
        let sink = Rc::clone(&hits);
        let id = input.id().to_string();
        input
            .on_immediate()
            .key_specific_keyup(move || sink.borrow_mut().push(id.clone()))
            .expect("subscribe");
    }

    for key in ["Enter", "a", "Enter"] {
        session.key_up("single", key).expect("key up");
        session.key_up("doubled", key).expect("key up");
    }

    assert_eq!(
        *hits.borrow(),
        ["single", "doubled", "single", "doubled"]
    );
    for id in ["single", "doubled"] {
        assert_eq!(
            session.client().dispatch_count(id, SYNTHETIC_EVENT).unwrap(),
            2
        );
    }
}

#[test]
fn second_attach_installs_no_extra_listener() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");
    input.attach_key_specific_keyup_event(["Enter"]).expect("attach");
    let features = input.features();

    let err = input
        .attach_key_specific_keyup_event(["Enter"])
        .unwrap_err();
    assert!(matches!(err, KeyupError::PreconditionViolation(_)));
    assert_eq!(input.features(), features);
    assert!(input.has_feature(Feature::KeySpecificKeyup));

    let immediate = Rc::new(Cell::new(0));
    let counter = Rc::clone(&immediate);
    input
        .on_immediate()
        .key_specific_keyup(move || counter.set(counter.get() + 1))
        .expect("subscribe");

    session.key_up("field", "Enter").expect("key up");
    assert_eq!(immediate.get(), 1);
    assert_eq!(
        session
            .client()
            .dispatch_count("field", SYNTHETIC_EVENT)
            .unwrap(),
        1
    );
}

#[test]
fn unusual_key_names_are_escaped() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "textarea").expect("input");
    input
        .attach_key_specific_keyup_event(["\"", "\\", "'"])
        .expect("attach");

    let keys = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&keys);
    input
        .on()
        .key_specific_keyup(move |event| sink.borrow_mut().push(event.key))
        .expect("subscribe");

    for key in ["\"", "\\", "'", "x"] {
        session.key_up("field", key).expect("key up");
    }

    assert_eq!(*keys.borrow(), ["\"", "\\", "'"]);
}

#[test]
fn subscription_before_attach_registers_nothing() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");

    assert!(matches!(
        input.on().key_specific_keyup(|_| {}),
        Err(KeyupError::PreconditionViolation(_))
    ));
    assert!(matches!(
        input.on_immediate().key_specific_keyup(|| {}),
        Err(KeyupError::PreconditionViolation(_))
    ));
    assert_eq!(
        session
            .page()
            .registry()
            .subscription_count("field", SYNTHETIC_EVENT),
        0
    );

    input.attach_key_specific_keyup_event(["Enter"]).expect("attach");
    assert_eq!(session.key_up("field", "Enter").expect("key up"), 0);
}

#[test]
fn non_input_elements_cannot_attach() {
    let session = session(ClientOptions::default());
    let err = session.input("label", "div").unwrap_err();
    let err = err.downcast::<KeyupError>().expect("keyup error");
    assert!(matches!(err, KeyupError::NotInputElement { .. }));
}

#[test]
fn redeclaring_an_input_keeps_the_client_filter() {
    let mut session = session(ClientOptions::default());
    let input = session.input("field", "input").expect("input");
    input.attach_key_specific_keyup_event(["Enter"]).expect("attach");
    session.pump();

    let again = session.input("field", "input").expect("input again");
    assert!(matches!(
        again.attach_key_specific_keyup_event(["Enter"]),
        Err(KeyupError::PreconditionViolation(_))
    ));
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    again
        .on_immediate()
        .key_specific_keyup(move || counter.set(counter.get() + 1))
        .expect("subscribe");

    assert_eq!(session.key_up("field", "Enter").expect("key up"), 1);
    assert_eq!(hits.get(), 1);
    assert_eq!(
        session
            .client()
            .dispatch_count("field", SYNTHETIC_EVENT)
            .unwrap(),
        1
    );
}

fn synthetic_event_shape(options: ClientOptions) -> String {
    let mut session = session(options);
    let input = session.input("field", "input").expect("input");
    input.attach_key_specific_keyup_event(["Enter"]).expect("attach");
    session.pump();

    session
        .client()
        .engine()
        .eval(
            r#"
                globalThis.__shape = [];
                document.getElementById('field').addEventListener('keySpecificKeyUpEvent', (event) => {
                    __shape.push([event.bubbles, event.cancelable, event.detail.key]);
                });
            "#,
            "synthetic-shape.js",
        )
        .expect("register listener");
    session.key_up("field", "Enter").expect("key up");

    session
        .client()
        .engine()
        .eval_with("JSON.stringify(__shape)", "read-shape.js")
        .expect("read shape")
}

#[test]
fn synthetic_event_bubbles_and_carries_key() {
    assert_eq!(
        synthetic_event_shape(ClientOptions::default()),
        r#"[[true,true,"Enter"]]"#
    );
}

#[test]
fn legacy_synthetic_event_matches_primary_path() {
    let legacy = synthetic_event_shape(ClientOptions {
        legacy_events: true,
    });
    assert_eq!(legacy, r#"[[true,true,"Enter"]]"#);
    assert_eq!(legacy, synthetic_event_shape(ClientOptions::default()));
}
