use formdesk_core::{
    api::{ErrorMessages, RecordCreatePayload, RecordUpdatePayload, TemplatePayload},
    storage::{RecordStore, RecordSubmitter, TemplateStore},
    CoreError, NoticeLevel, RecordEngine, RecordWorkspace, TemplateBuilder,
};
use formdesk_domain::{Field, FieldType, FieldValue, RecordData, Template};
use formdesk_storage_json::JsonFormStore;
use tempfile::tempdir;

fn onboarding() -> Template {
    Template::new("Onboarding")
        .with_description("New hires")
        .with_field(Field::new("field_a", FieldType::Text, "Name").with_required())
        .with_field(
            Field::new("field_b", FieldType::Select, "Dept")
                .with_order(1)
                .with_options(["Eng", " ", "Sales "]),
        )
        .with_field(Field::new("field_c", FieldType::Email, "Email").with_order(2))
}

fn data(values: &[(&str, &str)]) -> RecordData {
    values
        .iter()
        .map(|(key, value)| ((*key).to_string(), FieldValue::text(*value)))
        .collect()
}

fn field_messages(err: &CoreError, key: &str) -> Vec<String> {
    match err {
        CoreError::Rejected(remote) => remote
            .payload
            .errors
            .as_ref()
            .and_then(|errors| errors.get(key))
            .map(|messages| match messages {
                ErrorMessages::Many(messages) => messages.clone(),
                ErrorMessages::One(message) => vec![message.clone()],
            })
            .unwrap_or_default(),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn creating_a_template_assigns_ids_and_cleans_options() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");

    let saved = store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");
    assert_eq!(saved.id, Some(1));
    assert!(saved.created_at.is_some());
    let ids: Vec<&str> = saved.fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(saved.fields[1].options(), ["Eng", "Sales"]);
    assert!(saved.is_contiguous());
    assert!(store.path().exists());

    let reloaded = JsonFormStore::new(dir.path()).expect("reopen");
    let fetched = reloaded.get_template(1).expect("get");
    assert_eq!(fetched, saved);
}

#[test]
fn template_names_are_unique_case_insensitively() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");
    store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");

    let mut copy = onboarding();
    copy.name = "  ONBOARDING ".into();
    let err = store
        .create_template(&TemplatePayload::from_template(&copy))
        .expect_err("duplicate");
    assert_eq!(
        field_messages(&err, "name"),
        vec!["A form template with this name already exists."]
    );
    assert_eq!(store.list_templates().expect("list").len(), 1);
}

#[test]
fn template_payload_checks_fields_and_options() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");

    let empty = TemplatePayload {
        name: " ".into(),
        description: String::new(),
        fields: Vec::new(),
    };
    let err = store.create_template(&empty).expect_err("empty");
    assert_eq!(field_messages(&err, "name"), vec!["Name cannot be empty or whitespace."]);
    assert_eq!(field_messages(&err, "fields"), vec!["At least one field is required."]);

    let template = Template::new("Bad")
        .with_field(Field::new("a", FieldType::Text, "Same"))
        .with_field(Field::new("b", FieldType::Select, "same").with_options(["  "]));
    let err = store
        .create_template(&TemplatePayload::from_template(&template))
        .expect_err("bad fields");
    assert_eq!(field_messages(&err, "fields").len(), 1);
    assert_eq!(
        field_messages(&err, "options"),
        vec!["Options cannot be empty or whitespace."]
    );
}

#[test]
fn updating_keeps_known_field_ids_and_assigns_new_ones() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");
    let saved = store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");
    let id = saved.id.expect("id");

    let mut builder = TemplateBuilder::from_template(&saved);
    builder.add_field(FieldType::Date);
    builder.reorder("3", "1").expect("reorder");
    let updated = builder.save(&store).expect("update");

    let ids: Vec<&str> = updated.fields.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "1", "2", "4"]);
    assert_eq!(updated.created_at, saved.created_at);
    assert_eq!(store.list_templates().expect("list").len(), 1);
    assert_eq!(store.get_template(id).expect("get").fields.len(), 4);
}

#[test]
fn records_are_validated_against_their_template() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");
    let template = store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");
    let template_id = template.id.expect("id");

    let err = store
        .create_record(&RecordCreatePayload {
            form_template: template_id,
            data: data(&[("2", "HR"), ("3", "nope")]),
        })
        .expect_err("invalid");
    assert_eq!(
        field_messages(&err, "data"),
        vec![
            "Name is required",
            "Dept must be one of: Eng, Sales",
            "Email must be a valid email",
        ]
    );

    let err = store
        .create_record(&RecordCreatePayload {
            form_template: 99,
            data: RecordData::new(),
        })
        .expect_err("unknown template");
    assert_eq!(
        field_messages(&err, "form_template"),
        vec!["Invalid pk \"99\" - object does not exist."]
    );

    let record = store
        .create_record(&RecordCreatePayload {
            form_template: template_id,
            data: data(&[("1", "Alice"), ("2", "Eng")]),
        })
        .expect("create record");
    assert_eq!(record.id, Some(1));

    let updated = store
        .update_record(
            1,
            &RecordUpdatePayload {
                data: data(&[("1", "Alicia")]),
            },
        )
        .expect("update record");
    assert_eq!(updated.data.len(), 1);
    assert_eq!(updated.created_at, record.created_at);
    assert!(matches!(
        store.update_record(5, &RecordUpdatePayload { data: RecordData::new() }),
        Err(CoreError::RecordNotFound(_))
    ));
}

#[test]
fn engine_submits_through_the_store() {
    let dir = tempdir().expect("tempdir");
    let mut store = JsonFormStore::new(dir.path()).expect("store");
    let template = store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");

    let record = {
        let mut engine = RecordEngine::create(&template).expect("engine");
        engine.set_input("1", "Bob").expect("set");
        engine.submit(&mut store).expect("submit")
    };
    let mut engine = RecordEngine::edit(&template, &record).expect("edit");
    engine.set_input("3", "bob@example.com").expect("set");
    let saved = store.submit_record(formdesk_core::RecordSubmission::Update {
        id: record.id.expect("id"),
        payload: RecordUpdatePayload {
            data: engine.data().clone(),
        },
    });
    assert!(saved.is_ok());
    assert_eq!(store.list_records(None).expect("list").len(), 1);
}

#[test]
fn deleting_a_template_cascades_to_records() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");
    let first = store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");
    let mut other = onboarding();
    other.name = "Offboarding".into();
    let second = store
        .create_template(&TemplatePayload::from_template(&other))
        .expect("create");

    for (template, name) in [(&first, "A"), (&second, "B"), (&first, "C")] {
        store
            .create_record(&RecordCreatePayload {
                form_template: template.id.expect("id"),
                data: data(&[(template.fields[0].id.as_str(), name)]),
            })
            .expect("record");
    }
    assert_eq!(store.list_records(first.id).expect("list").len(), 2);

    store.delete_template(first.id.expect("id")).expect("delete");
    let remaining = store.list_records(None).expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].template_id, second.id.expect("id"));
    assert!(matches!(
        store.get_template(first.id.expect("id")),
        Err(CoreError::TemplateNotFound(_))
    ));
}

#[test]
fn bulk_delete_reports_removed_count() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");
    let template = store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");
    for name in ["A", "B", "C"] {
        store
            .create_record(&RecordCreatePayload {
                form_template: template.id.expect("id"),
                data: data(&[("1", name)]),
            })
            .expect("record");
    }

    assert_eq!(store.delete_records(&[1, 3, 77]).expect("bulk"), 2);
    let ids: Vec<_> = store
        .list_records(None)
        .expect("list")
        .into_iter()
        .filter_map(|record| record.id)
        .collect();
    assert_eq!(ids, vec![2]);
    assert!(matches!(store.delete_record(1), Err(CoreError::RecordNotFound(_))));
}

#[test]
fn workspace_bulk_delete_reports_when_nothing_matched() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFormStore::new(dir.path()).expect("store");
    let template = store
        .create_template(&TemplatePayload::from_template(&onboarding()))
        .expect("create");
    store
        .create_record(&RecordCreatePayload {
            form_template: template.id.expect("id"),
            data: data(&[("1", "A")]),
        })
        .expect("record");

    let mut workspace = RecordWorkspace::load(&store).expect("workspace");
    assert_eq!(workspace.delete_records(&store, &[40, 41]).expect("bulk"), 0);
    let notices = workspace.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(workspace.records().len(), 1);

    assert_eq!(workspace.delete_records(&store, &[1]).expect("bulk"), 1);
    let notices = workspace.take_notices();
    assert_eq!(notices[0].level, NoticeLevel::Success);
    assert_eq!(notices[0].message, "1 employee(s) deleted");
    assert!(workspace.records().is_empty());
}
