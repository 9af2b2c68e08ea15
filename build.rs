use vergen_gitcl::{CargoBuilder, Emitter, GitclBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cargo = CargoBuilder::default().target_triple(true).build()?;
	let mut emitter = Emitter::default();

	emitter.add_instructions(&cargo)?;

	// Source tarballs carry no git metadata.
	match GitclBuilder::default().sha(true).build() {
		Ok(gitcl) => {
			emitter.add_instructions(&gitcl)?;
		},
		Err(_) => println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown"),
	}

	emitter.emit()?;

	Ok(())
}
