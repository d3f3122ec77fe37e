use sigma_search::application::{App, Screen, Workflow};
use sigma_search::domain::{EyeColor, Field, FixedFoundSource, HairColor, SimulatedSearch, SkinColor};
use sigma_search::infrastructure::{
    AppConfig, AssetGate, AssetLocator, JsonRecordStore, RecordGateway, Session,
};
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn workflow(found: bool) -> Workflow {
    let resolved = AppConfig::default().resolve().unwrap();
    Workflow::new(
        resolved.credentials,
        Box::new(SimulatedSearch::new(FixedFoundSource(found))),
    )
    .with_search_delay(resolved.search_delay)
}

#[test]
fn test_report_found_person() {
    let mut wf = workflow(true);
    wf.login("Sigma", "AVANTE").unwrap();
    assert_eq!(wf.screen(), Screen::Form);

    wf.set_text(Field::FullName, "Maria da Silva").unwrap();
    wf.set_text(Field::MotherName, "Ana da Silva").unwrap();
    wf.set_skin_color(SkinColor::Parda).unwrap();
    wf.set_hair_color(HairColor::Preto).unwrap();
    wf.set_eye_color(EyeColor::Castanho).unwrap();
    assert_eq!(wf.progress(), 83);

    wf.submit().unwrap();
    assert_eq!(wf.screen(), Screen::Confirmation);

    let t0 = Instant::now();
    wf.start_search(t0).unwrap();
    assert!(!wf.poll(t0 + Duration::from_millis(500)));
    assert!(wf.poll(t0 + Duration::from_secs(3)));

    let result = wf.result().unwrap();
    assert!(result.found);
    assert_eq!(result.subject.name, "Maria da Silva");
    assert!(result.items.iter().any(|item| item.link.is_some()));
}

#[test]
fn test_report_not_found() {
    let mut wf = workflow(false);
    wf.login("Sigma", "AVANTE").unwrap();
    wf.set_text(Field::FullName, "João").unwrap();
    wf.set_text(Field::MotherName, "Rosa").unwrap();
    wf.set_skin_color(SkinColor::Branca).unwrap();
    wf.set_hair_color(HairColor::Loiro).unwrap();
    wf.set_eye_color(EyeColor::Azul).unwrap();
    wf.submit().unwrap();

    let t0 = Instant::now();
    wf.start_search(t0).unwrap();
    wf.poll(t0 + Duration::from_secs(5));

    let result = wf.result().unwrap();
    assert!(!result.found);
    assert!(result.items.is_empty());
    let titles: Vec<&str> = result.recommendations.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        ["Registro de Desaparecimento", "Ampliar a Busca", "Agendar Nova Busca"]
    );
}

#[test]
fn test_app_stores_report_and_result() {
    let dir = tempdir().unwrap();
    let store = JsonRecordStore::new(dir.path().join("records.json"));
    let locator = AssetLocator {
        path: dir.path().join("sigma.apk"),
        file_name: "sigma-search.apk".to_string(),
    };
    let gateway = RecordGateway::new(Box::new(store), AssetGate::new(None, locator));
    let mut app = App::new(workflow(true), Some(gateway));

    "Sigma".chars().for_each(|c| app.login_input(c));
    app.toggle_login_focus();
    "AVANTE".chars().for_each(|c| app.login_input(c));
    app.attempt_login();
    assert_eq!(app.screen(), Screen::Form);

    app.focus_field(Field::FullName);
    "Carla Dias".chars().for_each(|c| app.form_input(c));
    app.focus_field(Field::MotherName);
    "Lucia Dias".chars().for_each(|c| app.form_input(c));
    app.focus_field(Field::Phone);
    "11912345678".chars().for_each(|c| app.form_input(c));
    for field in [Field::SkinColor, Field::HairColor, Field::EyeColor] {
        app.focus_field(field);
        app.cycle_choice(true);
    }
    app.submit_form();
    assert_eq!(app.screen(), Screen::Confirmation);

    let t0 = Instant::now();
    app.start_search(t0);
    app.tick(t0 + Duration::from_secs(3));
    assert_eq!(app.screen(), Screen::Results);

    let reader = RecordGateway::new(
        Box::new(JsonRecordStore::new(dir.path().join("records.json"))),
        AssetGate::new(
            None,
            AssetLocator {
                path: dir.path().join("sigma.apk"),
                file_name: "sigma-search.apk".to_string(),
            },
        ),
    );
    let session = Session::authenticated("Sigma");
    let records = reader.list(&session).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].phone, "(11) 91234-5678");
    assert_eq!(records[0].submitted_by, "Sigma");
    assert!(reader.latest_search_result(&session, records[0].id).unwrap().unwrap().found);
}
