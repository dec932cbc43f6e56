fn main() {
  runboard_lib::run()
}
