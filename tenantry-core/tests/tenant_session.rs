use std::sync::{Arc, Mutex};

use tenantry_core::{
    ErrorKind, PresentationStore, StaticEnvironment, TenantEvent, TenantRegistry, TenantResolver,
    TenantSession, TenantryError, UrlEnvironment, PRIMARY_COLOR_VAR, SECONDARY_COLOR_VAR,
};

/// Test factory functions
fn registry() -> Arc<TenantRegistry> {
    Arc::new(TenantRegistry::builtin())
}

fn resolver() -> TenantResolver {
    TenantResolver::new(registry())
}

/// Every registered id selected by query parameter beats a conflicting subdomain.
#[test]
fn test_query_parameter_wins_for_every_registered_tenant() {
    let reg = registry();
    let resolver = resolver();

    for id in reg.ids() {
        for host in ["twilio.example.com", "startup.example.com", "default.example.com"] {
            let env = StaticEnvironment::new()
                .with_query("tenant", id.as_str())
                .with_host(host);
            let resolved = resolver.resolve(&env);
            assert_eq!(&resolved.id, id, "host {host}");
            assert_eq!(resolved, reg.lookup(id.as_str()).unwrap());
        }
    }
}

/// Unknown ids on either channel land on the designated default.
#[test]
fn test_unknown_tenant_ids_resolve_to_default() {
    let resolver = resolver();
    let fallback = registry().fallback();

    for unknown in ["acme", "Twilio", "", "www"] {
        let by_query = StaticEnvironment::new().with_query("tenant", unknown);
        assert_eq!(resolver.resolve(&by_query), fallback);

        let by_host = StaticEnvironment::new().with_host(format!("{unknown}.example.com"));
        assert_eq!(resolver.resolve(&by_host), fallback);
    }
}

#[test]
fn test_scenario_query_param_beats_subdomain() {
    let env = UrlEnvironment::parse("https://twilio.example.com/signup?tenant=default").unwrap();
    assert_eq!(resolver().resolve(&env).id, "default");
}

#[test]
fn test_scenario_unknown_subdomain_uses_fallback() {
    let env = UrlEnvironment::parse("https://unknown.example.com/").unwrap();
    assert_eq!(resolver().resolve(&env).id, "twilio");
}

#[test]
fn test_fallback_is_configurable() {
    let tenants: Vec<_> = registry()
        .ids()
        .iter()
        .map(|id| (*registry().lookup(id.as_str()).unwrap()).clone())
        .collect();
    let reg = Arc::new(TenantRegistry::new(tenants, "startup").unwrap());
    let env = UrlEnvironment::parse("http://127.0.0.1:5173/").unwrap();
    assert_eq!(TenantResolver::new(reg).resolve(&env).id, "startup");
}

/// Repeated identical switches leave the presentation variables on that tenant's colors.
#[test]
fn test_switch_tenant_is_idempotent() {
    let session = TenantSession::with_registry(registry());
    session.initialize(&StaticEnvironment::new());
    let startup = registry().lookup("startup").unwrap();

    for _ in 0..5 {
        session.switch_tenant(Arc::clone(&startup)).unwrap();
        let vars = session.presentation().snapshot();
        assert_eq!(vars.get(PRIMARY_COLOR_VAR), Some("#ff6b6b"));
        assert_eq!(vars.get(SECONDARY_COLOR_VAR), Some("#4ecdc4"));
        assert_eq!(vars.len(), 2);
    }
    assert_eq!(session.current().unwrap(), startup);
}

#[test]
fn test_shared_presentation_store_sees_switches() {
    let store = PresentationStore::new();
    let session = TenantSession::new(resolver(), store.clone());

    session.initialize(&StaticEnvironment::new().with_host("twilio.acme.io"));
    assert_eq!(store.primary_color().as_deref(), Some("#e74c3c"));

    session.switch_to("default").unwrap();
    assert_eq!(store.primary_color().as_deref(), Some("#3498db"));
    assert_eq!(store.secondary_color().as_deref(), Some("#667eea"));
}

#[test]
fn test_subscribers_see_initialize_and_switch() {
    let session = TenantSession::with_registry(registry());
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    let id = session.subscribe(Arc::new(move |event: &TenantEvent| {
        let line = match event {
            TenantEvent::Initialized(cfg) => format!("init:{}", cfg.id),
            TenantEvent::Switched { previous, current } => format!(
                "switch:{}->{}",
                previous.as_ref().map(|p| p.id.to_string()).unwrap_or_default(),
                current.id
            ),
        };
        sink.lock().unwrap().push(line);
    }));

    session.initialize(&StaticEnvironment::new().with_query("tenant", "twilio"));
    session.switch_to("startup").unwrap();
    assert!(session.unsubscribe(id));
    session.switch_to("default").unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["init:twilio".to_string(), "switch:twilio->startup".to_string()]
    );
}

#[test]
fn test_listener_can_read_session_during_notification() {
    let session = TenantSession::with_registry(registry());
    let handle = session.handle();
    let observed = Arc::new(Mutex::new(None));

    let slot = Arc::clone(&observed);
    session.subscribe(Arc::new(move |_event: &TenantEvent| {
        *slot.lock().unwrap() = handle.current().map(|c| c.id.clone());
    }));

    session.switch_to("twilio").unwrap();
    assert_eq!(observed.lock().unwrap().as_ref().unwrap(), "twilio");
}

#[test]
fn test_switch_to_unknown_reports_not_found() {
    let session = TenantSession::with_registry(registry());
    let err = session.switch_to("acme").unwrap_err();
    assert_eq!(TenantryError::kind_of(&err), Some(ErrorKind::NotFound));
    assert!(session.current().is_none());
}
