mod common;

use std::path::Path;

use mdon_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

const README: &str = "# Demo\n\n<? {{ name }} ?>\nstale\n<?!>\n";

fn project(root: &Path) -> AnyEmptyResult {
	std::fs::write(root.join("package.json"), r#"{ "name": "demo", "version": "0.1.0" }"#)?;
	std::fs::write(root.join("README.md"), README)?;
	Ok(())
}

#[test]
fn processes_readme_in_place() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;

	common::mdon_cmd()
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("mdon: README.md done in"))
		.stdout(predicates::str::contains(" ms"));

	let content = std::fs::read_to_string(tmp.path().join("README.md"))?;
	assert!(content.starts_with("# Demo\n\n<? {{ name }} ?>\ndemo\n<?!>\n\n<? ! ?>\n"));
	assert!(content.contains("Last Updated: "));
	assert!(!content.contains("stale"));

	Ok(())
}

#[test]
fn dry_run_prints_without_writing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("--dry-run")
		.assert()
		.success()
		.stdout(predicates::str::contains("<? {{ name }} ?>\ndemo\n<?!>"));

	let content = std::fs::read_to_string(tmp.path().join("README.md"))?;
	assert_eq!(content, README);

	Ok(())
}

#[test]
fn writes_suffixed_copy() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("--suffix")
		.arg(".out")
		.assert()
		.success()
		.stdout(predicates::str::contains("mdon: README.out.md done in"));

	assert_eq!(std::fs::read_to_string(tmp.path().join("README.md"))?, README);
	let content = std::fs::read_to_string(tmp.path().join("README.out.md"))?;
	assert!(content.contains("<? {{ name }} ?>\ndemo\n<?!>"));

	Ok(())
}

#[test]
fn rejects_invalid_suffix() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("--suffix")
		.arg("out")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("the suffix `out` is unsupported"));

	Ok(())
}

#[test]
fn processes_documents_from_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;
	std::fs::write(tmp.path().join("GUIDE.md"), "<? {{ version }} ?>\n<?!>\n")?;
	std::fs::write(tmp.path().join("mdon.toml"), "documents = [\"GUIDE.md\"]\n")?;

	common::mdon_cmd()
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("mdon: GUIDE.md done in"))
		.stdout(predicates::str::contains("README.md").not());

	let guide = std::fs::read_to_string(tmp.path().join("GUIDE.md"))?;
	assert!(guide.starts_with("<? {{ version }} ?>\n0.1.0\n<?!>\n"));
	assert_eq!(std::fs::read_to_string(tmp.path().join("README.md"))?, README);

	Ok(())
}

#[test]
fn positional_documents_override_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;
	std::fs::write(tmp.path().join("GUIDE.md"), "<? {{ version }} ?>\n<?!>\n")?;
	std::fs::write(tmp.path().join("mdon.toml"), "documents = [\"GUIDE.md\"]\n")?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("README.md")
		.assert()
		.success()
		.stdout(predicates::str::contains("mdon: README.md done in"));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("GUIDE.md"))?,
		"<? {{ version }} ?>\n<?!>\n"
	);

	Ok(())
}

#[test]
fn strict_mode_fails_on_unterminated_directive() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;
	std::fs::write(tmp.path().join("README.md"), "# Demo\n<? {{ name }} ?>\nno close\n")?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("--strict")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("unterminated directive"));

	common::mdon_cmd().arg(tmp.path()).assert().success();

	Ok(())
}

#[test]
fn backup_keeps_previous_output() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("--backup")
		.assert()
		.success()
		.stdout(predicates::str::contains("backed up to README.md.0"));

	assert_eq!(std::fs::read_to_string(tmp.path().join("README.md.0"))?, README);

	Ok(())
}

#[test]
fn diff_shows_changes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("--dry-run")
		.arg("--diff")
		.assert()
		.success()
		.stdout(predicates::str::contains("-stale"))
		.stdout(predicates::str::contains("+demo"));

	Ok(())
}

#[test]
fn preview_numbers_lines() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;

	common::mdon_cmd()
		.arg(tmp.path())
		.arg("--dry-run")
		.arg("--preview")
		.assert()
		.success()
		.stdout(predicates::str::contains("┌─ README.md"))
		.stdout(predicates::str::contains("1 │ # Demo"))
		.stdout(predicates::str::contains("4 │ demo"));

	Ok(())
}

#[test]
fn failing_directives_are_logged_and_contained() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	project(tmp.path())?;
	std::fs::write(tmp.path().join("README.md"), "<? {{ missing }} ?>\n<?!>\n")?;

	common::mdon_cmd()
		.arg(tmp.path())
		.assert()
		.success()
		.stderr(predicates::str::contains("directive failed"));

	let content = std::fs::read_to_string(tmp.path().join("README.md"))?;
	assert!(content.contains("<!-- `Cannot read property `missing` of the context` -->"));

	Ok(())
}
