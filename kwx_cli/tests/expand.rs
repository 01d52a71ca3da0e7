mod common;

use kwx_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use similar_asserts::assert_eq;

const CONFIG: &str = r#"
[[source]]
prefix = "pkg"
path = "package.json"

[[source]]
prefix = "app"
values = { name = "app-name", channel = "stable" }

[overrides]
name = "app"
"#;

const PACKAGE: &str = r#"{ "name": "kwx", "version": "1.2.3", "private": false }"#;

fn project() -> std::io::Result<tempfile::TempDir> {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("kwx.toml"), CONFIG)?;
	std::fs::write(tmp.path().join("package.json"), PACKAGE)?;
	Ok(tmp)
}

#[test]
fn expand_reads_stdin_and_writes_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("name=world")
		.write_stdin("hello {name}, \\{name} and \\\\")
		.assert()
		.success()
		.stdout("hello world, {name} and \\");

	Ok(())
}

#[test]
fn expand_treats_dash_as_stdin() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("-")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("x=1")
		.write_stdin("{set.x}")
		.assert()
		.success()
		.stdout("1");

	Ok(())
}

#[test]
fn expand_uses_configured_sources_and_overrides() -> AnyEmptyResult {
	let tmp = project()?;
	std::fs::write(
		tmp.path().join("input.txt"),
		"{pkg.name}@{version} ({channel}) private={private} name={name}\n",
	)?;

	// The `name` override beats even an explicit `pkg.` prefix.
	common::kwx_cmd()
		.arg("expand")
		.arg(tmp.path().join("input.txt"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("app-name@1.2.3 (stable) private=false name=app-name\n");

	Ok(())
}

#[test]
fn expand_assignments_take_precedence_over_config() -> AnyEmptyResult {
	let tmp = project()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("version=9.9.9")
		.write_stdin("{version} {pkg.version}")
		.assert()
		.success()
		.stdout("9.9.9 1.2.3");

	Ok(())
}

#[test]
fn expand_writes_output_file() -> AnyEmptyResult {
	let tmp = project()?;
	let output = tmp.path().join("out.txt");

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--output")
		.arg(&output)
		.write_stdin("v{pkg.version}")
		.assert()
		.success()
		.stdout("");

	assert_eq!(std::fs::read_to_string(&output)?, "v1.2.3");

	Ok(())
}

#[test]
fn expand_loads_explicit_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config = tmp.path().join("custom.toml");
	std::fs::write(
		&config,
		"[[source]]\nprefix = \"custom\"\nvalues = { greeting = \"hi\" }\n",
	)?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--config")
		.arg(&config)
		.write_stdin("{custom.greeting}!")
		.assert()
		.success()
		.stdout("hi!");

	Ok(())
}

#[test]
fn expand_keeps_output_before_unknown_keyword() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("name=world")
		.write_stdin("hello {name} {missing} tail")
		.assert()
		.code(2)
		.stdout("hello world ")
		.stderr(predicates::str::contains("missing").and(predicates::str::contains("tail").not()));

	Ok(())
}

#[test]
fn expand_reports_unknown_prefix() -> AnyEmptyResult {
	let tmp = project()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("{nope.name}")
		.assert()
		.code(2)
		.stdout("")
		.stderr(predicates::str::contains("nope.name"));

	Ok(())
}

#[test]
fn expand_reports_invalid_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("kwx.toml"), "[[source]\nprefix = ")?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("text")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn expand_reports_missing_input_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.arg("expand")
		.arg(tmp.path().join("absent.txt"))
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stdout("")
		.stderr(
			predicates::str::contains("absent.txt")
				.and(predicates::str::contains("failed to open input file")),
		);

	Ok(())
}

#[test]
fn expand_reports_uncreatable_output_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--output")
		.arg(tmp.path().join("no-such-dir").join("out.txt"))
		.write_stdin("text")
		.assert()
		.code(2)
		.stderr(
			predicates::str::contains("out.txt")
				.and(predicates::str::contains("failed to create output file")),
		);

	Ok(())
}

#[test]
fn log_filter_sends_trace_events_to_stderr_only() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.env("KWX_LOG", "trace")
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("x=1")
		.write_stdin("{set.x}")
		.assert()
		.success()
		.stdout("1")
		.stderr(predicates::str::contains("expanding through prefix"));

	Ok(())
}

#[test]
fn verbose_enables_debug_events() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("x=1")
		.write_stdin("{x}")
		.assert()
		.success()
		.stdout("1")
		.stderr(
			predicates::str::contains("registering keyword resolver")
				.and(predicates::str::contains("expanding through").not()),
		);

	Ok(())
}

#[test]
fn log_filter_takes_precedence_over_verbose() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.env("KWX_LOG", "error")
		.arg("expand")
		.arg("--verbose")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("x=1")
		.write_stdin("{x}")
		.assert()
		.success()
		.stdout("1")
		.stderr("");

	Ok(())
}

#[test]
fn default_logging_is_quiet() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::kwx_cmd()
		.arg("expand")
		.arg("--path")
		.arg(tmp.path())
		.arg("--set")
		.arg("x=1")
		.write_stdin("{x}")
		.assert()
		.success()
		.stderr("");

	Ok(())
}

#[test]
fn expand_rejects_malformed_assignment() {
	common::kwx_cmd()
		.arg("expand")
		.arg("--set")
		.arg("no-equals-sign")
		.assert()
		.failure()
		.stderr(predicates::str::contains("expected KEY=VALUE"));
}

#[test]
fn missing_subcommand_prints_hint() {
	common::kwx_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("kwx --help"));
}
