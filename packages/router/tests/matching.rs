use pretty_assertions::assert_eq;
use waypost_router::{location::normalize_location, prelude::*};

fn paths(router: &Router) -> Vec<String> {
    router.get_routes().into_iter().map(|r| r.path).collect()
}

#[test]
fn child_paths_join_their_parent() {
    let router = Router::new(RouterOptions::default().route(
        RouteConfig::new("/a").children([RouteConfig::new("b"), RouteConfig::new("/b")]),
    ));

    assert_eq!(paths(&router), ["/a/b", "/b", "/a"]);

    let route = router.match_route("/b", None);
    assert_eq!(route.matched().len(), 2);
    let leaf = router.record(route.matched()[1]).unwrap();
    assert_eq!(leaf.path, "/b");
    assert_eq!(leaf.parent, Some(route.matched()[0]));
}

#[test]
fn params_are_extracted() {
    let router = Router::new(RouterOptions::default().route(RouteConfig::new("/baz/:id")));

    let route = router.match_route("/baz/42", None);
    assert_eq!(route.param("id"), Some("42"));
    assert_eq!(route.matched().len(), 1);
}

#[test]
fn unknown_names_match_nothing() {
    let router = Router::new(RouterOptions::default().route(RouteConfig::new("/").name("home")));

    let route = router.match_route(LocationDescriptor::named("missing"), None);
    assert!(route.matched().is_empty());
}

#[test]
fn query_survives_matching() {
    let router = Router::new(RouterOptions::default().route(RouteConfig::new("/search")));

    let route = router.match_route("/search?a=1&b=2&b=3", None);
    assert_eq!(route.query()["a"], QueryValue::from("1"));
    assert_eq!(route.query()["b"], QueryValue::from(vec!["2", "3"]));
    assert_eq!(route.full_path(), "/search?a=1&b=2&b=3");
}

#[test]
fn normalizing_is_idempotent() {
    let router = Router::new(RouterOptions::default().route(RouteConfig::new("/docs/:page")));
    let current = router.match_route("/docs/intro", None);

    let once = normalize_location(&"setup?x=1#top".into(), Some(&current), false);
    let twice = normalize_location(&RawLocation::Normalized(once.clone()), Some(&current), false);
    assert_eq!(once, twice);
    assert_eq!(once.path.as_deref(), Some("/docs/setup"));
}

#[test]
fn routes_can_be_added_later() {
    let router = Router::new(RouterOptions::default().route(RouteConfig::new("/admin").name("admin")));

    router.add_child_route("admin", RouteConfig::new("users").name("admin-users"));
    router.add_child_route("nope", RouteConfig::new("orphan"));
    router.add_routes([RouteConfig::new("/about"), RouteConfig::new("/admin")]);
    router.add_route(RouteConfig::new("/contact"));

    assert_eq!(
        paths(&router),
        ["/admin", "/admin/users", "/orphan", "/about", "/contact"]
    );

    let route = router.match_route(LocationDescriptor::named("admin-users"), None);
    assert_eq!(route.path(), "/admin/users");
    assert_eq!(route.matched().len(), 2);
}

#[test]
fn duplicates_keep_the_first_registration() {
    let router = Router::new(RouterOptions::default().routes([
        RouteConfig::new("/x").name("x").meta("which", "first"),
        RouteConfig::new("/x").name("x").meta("which", "second"),
    ]));

    assert_eq!(paths(&router), ["/x"]);
    let route = router.match_route(LocationDescriptor::named("x"), None);
    assert_eq!(route.meta()["which"], "first");
}

#[test]
fn resolve_builds_links() {
    let router = Router::new(
        RouterOptions::default()
            .base("/app/")
            .route(RouteConfig::new("/users").name("users").child(RouteConfig::new(":id").name("user"))),
    );

    let resolved = router.resolve(
        LocationDescriptor::named("user").param("id", 7).query("tab", "posts"),
        None,
        false,
    );
    assert_eq!(resolved.href, "/app/#/users/7?tab=posts");
    assert_eq!(resolved.route.name(), Some("user"));
    assert_eq!(resolved.location.name.as_deref(), Some("user"));

    let current = router.match_route("/users/7", None);
    let resolved = router.resolve("settings", Some(&current), true);
    assert_eq!(resolved.route.path(), "/users/7/settings");
    assert!(resolved.route.matched().is_empty());
    assert_eq!(resolved.href, "/app/#/users/7/settings");
}

#[test]
fn records_carry_their_slots() {
    let router = Router::new(RouterOptions::default().route(
        RouteConfig::new("/")
            .component(Component::new("Main"))
            .named_component("aside", Component::new("Aside")),
    ));

    let routes = router.get_routes();
    assert_eq!(routes[0].slots, ["default", "aside"]);
}
