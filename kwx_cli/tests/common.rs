use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn kwx_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("kwx"));
	cmd.env("NO_COLOR", "1").env_remove("KWX_LOG");
	cmd
}
